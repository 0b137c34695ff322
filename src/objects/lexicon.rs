//! Closed-class word lists for the built-in tagger, lemmatizer and filter.

pub const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

pub const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no",
    "another", "all", "both", "either", "neither", "several", "many", "few", "much", "such",
];

pub const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
    "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours",
    "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom", "whose", "which",
    "what", "something", "someone", "anything", "nothing", "everything",
];

pub const PREPOSITIONS: &[&str] = &[
    "on", "in", "at", "of", "with", "under", "over", "above", "below", "beside", "besides",
    "near", "behind", "between", "into", "onto", "from", "by", "for", "through", "across",
    "along", "around", "against", "among", "inside", "outside", "beneath", "underneath", "upon",
    "atop", "toward", "towards", "without", "within", "like", "about", "after", "before",
    "during", "past", "up", "down", "off", "out", "beyond", "throughout", "via", "amid", "as",
    "while", "if", "because", "than",
];

pub const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];

pub const MODALS: &[&str] = &[
    "can", "could", "may", "might", "must", "shall", "should", "will", "would",
];

pub const AUXILIARIES: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "am", "has", "have", "had", "having",
    "do", "does", "did", "doing", "'s", "'re",
];

pub const ADVERBS: &[&str] = &[
    "very", "not", "too", "also", "just", "quite", "really", "here", "there", "then", "now",
    "always", "never", "almost", "slightly", "partly", "together", "again", "away", "even",
    "still", "only", "rather", "somewhat", "mostly", "nearby", "outdoors", "indoors",
    "where", "when", "why", "how",
];

pub const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "dozen", "hundred", "thousand", "first", "second", "third",
];

pub const ADJECTIVES: &[&str] = &[
    // colours
    "red", "green", "blue", "yellow", "orange", "purple", "violet", "pink", "brown", "black",
    "white", "gray", "grey", "golden", "silver", "beige", "teal", "turquoise", "cyan",
    "magenta", "crimson", "scarlet", "navy", "maroon", "colorful", "colourful", "pastel",
    // size and shape
    "big", "small", "large", "tiny", "huge", "little", "tall", "short", "long", "wide",
    "narrow", "thick", "thin", "giant", "massive", "round", "square", "flat", "curved",
    "straight", "pointy", "oval", "rectangular", "circular", "triangular",
    // appearance and condition
    "old", "new", "young", "ancient", "modern", "happy", "sad", "angry", "beautiful", "pretty",
    "ugly", "cute", "bright", "dark", "light", "pale", "vivid", "shiny", "dull", "empty",
    "full", "open", "closed", "wet", "dry", "hot", "cold", "warm", "cool", "sunny", "cloudy",
    "rainy", "snowy", "foggy", "windy", "fluffy", "fuzzy", "soft", "hard", "smooth", "rough",
    "wooden", "metallic", "plastic", "simple", "plain", "detailed", "striped", "spotted",
    "curly", "clear", "blurry", "calm", "quiet", "busy", "crowded", "lush", "leafy",
    "grassy", "rocky", "sandy", "wild", "fresh", "ripe", "juicy", "delicious", "tasty", "funny",
    "friendly", "lonely", "peaceful", "serene", "abstract", "realistic", "sketchy",
    "hand-drawn", "messy", "neat", "clean", "dirty", "heavy", "fast", "slow", "high", "low",
    "deep", "shallow", "far", "left", "right", "upper", "lower", "middle", "central", "single",
    "double", "other", "various", "different", "same", "main", "whole",
];

pub const VERB_STEMS: &[&str] = &[
    "sit", "stand", "hold", "run", "play", "fly", "show", "depict", "feature", "contain", "look",
    "lie", "walk", "jump", "swim", "eat", "drink", "wear", "ride", "smile", "sleep", "float",
    "hang", "grow", "rest", "stretch", "lean", "chase", "carry", "face", "read", "write", "draw",
    "paint", "fall", "shine", "rise", "cover", "surround", "sing", "dance", "climb", "watch",
    "wait", "perch", "graze", "bark", "roar", "bloom", "flow", "stare", "reach", "point",
    "hug", "kiss", "cry", "laugh", "throw", "catch", "kick", "fill", "sail", "drive", "park",
];

/// Nouns that the `-ing`, `-ed` and `-ly` suffix rules would mislabel.
pub const SUFFIX_NOUNS: &[&str] = &[
    "building", "painting", "drawing", "ceiling", "clothing", "ring", "king", "wing", "string",
    "thing", "morning", "evening", "spring", "swing", "sling", "sibling", "duckling", "pudding",
    "stocking", "railing", "wedding", "bed", "shed", "sled", "seed", "weed", "reed",
    "steed", "hundred", "family", "fly", "butterfly", "dragonfly", "lily", "belly", "jelly",
    "bully", "rally", "valley", "trolley", "alley", "holly", "ally",
];

pub const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("people", "person"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("leaves", "leaf"),
    ("knives", "knife"),
    ("wolves", "wolf"),
    ("loaves", "loaf"),
    ("shelves", "shelf"),
    ("lives", "life"),
    ("wives", "wife"),
    ("halves", "half"),
    ("calves", "calf"),
    ("scarves", "scarf"),
    ("thieves", "thief"),
    ("cacti", "cactus"),
    ("fungi", "fungus"),
    ("dice", "die"),
];

/// Plurals and mass nouns whose trailing `s` is not an inflection.
pub const INVARIANT_NOUNS: &[&str] = &[
    "sheep", "fish", "deer", "series", "species", "news", "scissors", "pants", "trousers",
    "jeans", "shorts", "glasses", "clothes", "mathematics", "physics", "chess", "bus", "gas",
    "lens", "canvas", "iris", "cactus", "octopus", "hippopotamus", "walrus", "asparagus",
    "hummus", "bonus", "circus", "virus", "campus", "citrus", "grass", "class", "glass", "dress",
    "moss", "boss", "cross", "kiss", "chassis", "tennis", "analysis", "basis", "axis", "oasis",
];

/// Plurals ending in `-oes` that drop the whole suffix.
pub const OES_PLURALS: &[&str] = &[
    "tomatoes", "potatoes", "heroes", "echoes", "volcanoes", "torpedoes", "mosquitoes",
    "dominoes", "mangoes", "buffaloes",
];

pub fn contains(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}
