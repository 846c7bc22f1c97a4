//! Pose record: OpenPose BODY_25 plus both hands.
//!
//! Stored under [`POSE_KEY`] as OpenPose-style JSON with flat `x, y, c`
//! arrays. A joint written as `0, 0, 0` is absent.

use crate::metadata::png::{read_text_record, write_text_record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Record key for the pose payload.
pub const POSE_KEY: &str = "SoftSinPose";

/// Payload version written by this crate.
pub const POSE_VERSION: f64 = 1.3;

/// BODY_25 joint count.
pub const BODY_JOINTS: usize = 25;

/// Joints per hand.
pub const HAND_JOINTS: usize = 21;

/// Limb groups that carry a per-limb depth in the view options.
pub const LIMBS: [&str; 8] = ["rarm", "larm", "rleg", "lleg", "torso", "head", "lhand", "rhand"];

const PIXELS_FORMAT: &str = "body25+hands-pixels";
const NORMALIZED_FORMAT: &str = "body25+hands-normalized";

/// One joint in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Confidence.
    pub c: f64,
}

impl Keypoint {
    /// A fully confident joint.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, c: 1.0 }
    }
}

/// A single skeleton in pixel coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    /// BODY_25 joints.
    pub body: [Option<Keypoint>; BODY_JOINTS],
    /// Left hand joints.
    pub left_hand: [Option<Keypoint>; HAND_JOINTS],
    /// Right hand joints.
    pub right_hand: [Option<Keypoint>; HAND_JOINTS],
}

impl Skeleton {
    /// Number of joints present across body and hands.
    pub fn joint_count(&self) -> usize {
        self.body
            .iter()
            .chain(&self.left_hand)
            .chain(&self.right_hand)
            .filter(|k| k.is_some())
            .count()
    }
}

/// Coordinate space of the flat arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypointFormat {
    /// Image pixels.
    Pixels,
    /// Fractions of the image size.
    Normalized,
}

impl KeypointFormat {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pixels => PIXELS_FORMAT,
            Self::Normalized => NORMALIZED_FORMAT,
        }
    }

    /// Classify a wire name. Anything mentioning pixels is pixel space.
    pub fn from_wire(name: &str) -> Self {
        if name.contains("pixels") {
            Self::Pixels
        } else {
            Self::Normalized
        }
    }
}

/// Flat keypoint arrays for one person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonKeypoints {
    /// Body joints.
    pub pose_keypoints_2d: Vec<f64>,
    /// Always empty; kept for format compatibility.
    pub face_keypoints_2d: Vec<f64>,
    /// Left hand.
    pub hand_left_keypoints_2d: Vec<f64>,
    /// Right hand.
    pub hand_right_keypoints_2d: Vec<f64>,
    /// Per-person view options, consulted when the payload has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub softsin_view: Option<Value>,
}

/// The complete pose record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosePayload {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: f64,
    /// People; only the first is used.
    #[serde(default)]
    pub people: Vec<PersonKeypoints>,
    /// Image size the coordinates refer to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<[u32; 2]>,
    /// Coordinate space name.
    #[serde(default)]
    pub keypoint_format: String,
    /// Display options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub softsin_view: Option<Value>,
}

fn default_version() -> f64 {
    POSE_VERSION
}

impl PosePayload {
    /// Flatten a skeleton for an image of `width` x `height`.
    pub fn from_skeleton(
        skeleton: &Skeleton,
        width: u32,
        height: u32,
        format: KeypointFormat,
    ) -> Self {
        let (sx, sy) = match format {
            KeypointFormat::Pixels => (1.0, 1.0),
            KeypointFormat::Normalized => (scale_of(width), scale_of(height)),
        };
        Self {
            version: POSE_VERSION,
            people: vec![PersonKeypoints {
                pose_keypoints_2d: flatten(&skeleton.body, sx, sy),
                face_keypoints_2d: Vec::new(),
                hand_left_keypoints_2d: flatten(&skeleton.left_hand, sx, sy),
                hand_right_keypoints_2d: flatten(&skeleton.right_hand, sx, sy),
                softsin_view: None,
            }],
            image_size: Some([width, height]),
            keypoint_format: format.as_str().to_string(),
            softsin_view: None,
        }
    }

    /// Attach display options at the top level.
    pub fn with_view(mut self, view: &ViewOptions) -> Self {
        self.softsin_view = serde_json::to_value(view).ok();
        self
    }

    /// Coordinate space of the arrays.
    pub fn format(&self) -> KeypointFormat {
        KeypointFormat::from_wire(&self.keypoint_format)
    }

    /// Rebuild the first person's skeleton in pixels of a `width` x `height` image.
    ///
    /// Returns `None` if the payload holds no people.
    pub fn to_skeleton(&self, width: u32, height: u32) -> Option<Skeleton> {
        let person = self.people.first()?;
        let (sx, sy) = match self.format() {
            KeypointFormat::Pixels => (1.0, 1.0),
            KeypointFormat::Normalized => (width as f64, height as f64),
        };
        let mut skeleton = Skeleton::default();
        unflatten(&person.pose_keypoints_2d, &mut skeleton.body, sx, sy);
        unflatten(&person.hand_left_keypoints_2d, &mut skeleton.left_hand, sx, sy);
        unflatten(&person.hand_right_keypoints_2d, &mut skeleton.right_hand, sx, sy);
        Some(skeleton)
    }

    /// Display options from the payload, falling back to the first person.
    pub fn view(&self) -> Option<ViewOptions> {
        let raw = self
            .softsin_view
            .as_ref()
            .or_else(|| self.people.first()?.softsin_view.as_ref())?;
        ViewOptions::from_value(raw)
    }

    /// Parse a record value. Corrupt JSON is logged and yields `None`.
    pub fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(payload) => Some(payload),
            Err(e) => {
                log::warn!("ignoring corrupt {} record: {}", POSE_KEY, e);
                None
            }
        }
    }
}

fn scale_of(extent: u32) -> f64 {
    extent.max(1) as f64
}

fn flatten(joints: &[Option<Keypoint>], sx: f64, sy: f64) -> Vec<f64> {
    joints
        .iter()
        .flat_map(|k| match k {
            Some(k) => [k.x / sx, k.y / sy, k.c],
            None => [0.0, 0.0, 0.0],
        })
        .collect()
}

fn unflatten(flat: &[f64], joints: &mut [Option<Keypoint>], sx: f64, sy: f64) {
    for (i, slot) in joints.iter_mut().enumerate() {
        let at = |k: usize| flat.get(i * 3 + k).copied().unwrap_or(0.0);
        let (x, y, c) = (at(0), at(1), at(2));
        *slot = if x != 0.0 && y != 0.0 && x.is_finite() && y.is_finite() {
            Some(Keypoint {
                x: x * sx,
                y: y * sy,
                c: if c != 0.0 && c.is_finite() { c } else { 1.0 },
            })
        } else {
            None
        };
    }
}

/// Skeleton display options.
///
/// Only keys present in the record are set; numbers are clamped into range
/// and non-numeric values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    /// Tint bones by limb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_pose_colors: Option<bool>,
    /// Tint joints by limb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_joints_by_limb: Option<bool>,
    /// Draw bones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_skeleton: Option<bool>,
    /// Dim limbs behind the torso.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim_back_layers: Option<bool>,
    /// Bone width, 1 to 64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bone_stroke_width: Option<f64>,
    /// Joint radius, 1 to 64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joint_radius: Option<f64>,
    /// Per-limb depth, 0 to 2, keyed by [`LIMBS`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub depth_map: BTreeMap<String, f64>,
}

impl ViewOptions {
    /// Read options from raw JSON. `None` unless `raw` is an object.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let flag = |key: &str| obj.get(key).map(truthy);
        let number = |key: &str, lo: f64, hi: f64, fallback: f64| {
            obj.get(key).map(|v| clamp_number(v, lo, hi, fallback))
        };

        let depth_map = obj
            .get("depthMap")
            .and_then(Value::as_object)
            .map(|dm| {
                LIMBS
                    .iter()
                    .filter_map(|&limb| {
                        dm.get(limb)
                            .map(|v| (limb.to_string(), clamp_number(v, 0.0, 2.0, 1.0)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            use_pose_colors: flag("usePoseColors"),
            color_joints_by_limb: flag("colorJointsByLimb"),
            show_skeleton: flag("showSkeleton"),
            dim_back_layers: flag("dimBackLayers"),
            bone_stroke_width: number("boneStrokeWidth", 1.0, 64.0, 6.0),
            joint_radius: number("jointRadius", 1.0, 64.0, 3.0),
            depth_map,
        })
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn clamp_number(v: &Value, lo: f64, hi: f64, fallback: f64) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => n.clamp(lo, hi),
        _ => fallback,
    }
}

/// Read the pose record from a container.
pub fn read_pose(container: &[u8]) -> Option<PosePayload> {
    PosePayload::parse(&read_text_record(container, POSE_KEY)?)
}

/// Stamp a pose record into a container.
pub fn write_pose(container: &[u8], payload: &PosePayload) -> serde_json::Result<Vec<u8>> {
    let json = serde_json::to_string(payload)?;
    Ok(write_text_record(container, POSE_KEY, &json))
}
