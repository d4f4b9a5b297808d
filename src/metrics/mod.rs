//! Metrics calculation modules.

pub mod iou;
pub mod ap;
pub mod precision_recall;
pub mod f1_score;

pub use iou::{box_iou, instance_iou, mask_iou, IouMethod};
pub use ap::{average_precision, calculate_ap, calculate_map};
pub use precision_recall::{calculate_precision_recall, PrecisionRecall, PrecisionRecallPoint};
pub use f1_score::{calculate_f1_from_pr, calculate_f1_score};
