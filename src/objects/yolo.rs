use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use super::detect::{Detection, ObjectDetector};
use crate::embedding::onnx::{build_session, model_file};

const YOLO_INPUT_SIZE: u32 = 640;
/// Four box coordinates precede the class scores in each prediction column.
const BOX_FIELDS: usize = 4;

const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// YOLOv8 detector exported to ONNX as `<model_id>.onnx`; output `[1, 84, N]`.
pub struct OnnxYoloDetector {
    model_id: String,
    min_confidence: f32,
    session: Mutex<Session>,
}

impl OnnxYoloDetector {
    pub fn load(models_dir: &Path, model_id: &str, min_confidence: f32) -> Result<Self> {
        let path = model_file(models_dir, &format!("{model_id}.onnx"))?;
        let session = build_session(&path)?;
        info!(model_id, model = %path.display(), "loaded YOLO session");

        Ok(Self {
            model_id: model_id.to_string(),
            min_confidence,
            session: Mutex::new(session),
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn detect(&self, image: &Path) -> Result<Vec<Detection>> {
        let decoded = image::open(image)
            .with_context(|| format!("failed to decode image: {}", image.display()))?;
        let input = Tensor::from_array(preprocess_image(&decoded))
            .map_err(|err| anyhow!("failed to create image tensor: {err}"))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("YOLO session lock poisoned"))?;
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());
        let outputs = session
            .run(ort::inputs![input_name => input])
            .map_err(|err| anyhow!("YOLO inference failed: {err}"))?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| anyhow!("failed to extract detections: {err}"))?;

        if shape.len() != 3 || shape[1] as usize != BOX_FIELDS + COCO_LABELS.len() {
            bail!("unexpected YOLO output shape {shape:?}");
        }
        let predictions = shape[2] as usize;

        let mut detections = Vec::new();
        for column in 0..predictions {
            let best = (0..COCO_LABELS.len())
                .map(|class| (class, data[(BOX_FIELDS + class) * predictions + column]))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((class, confidence)) = best
                && confidence >= self.min_confidence
            {
                detections.push(Detection {
                    label: COCO_LABELS[class].to_string(),
                    confidence,
                });
            }
        }

        Ok(detections)
    }
}

/// Plain resize to the square input, RGB scaled to [0, 1], NCHW.
fn preprocess_image(image: &image::DynamicImage) -> Array4<f32> {
    let resized = image
        .resize_exact(YOLO_INPUT_SIZE, YOLO_INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();
    let size = YOLO_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3usize {
            tensor[[0, channel, y as usize, x as usize]] = f32::from(pixel[channel]) / 255.0;
        }
    }

    tensor
}
