pub mod blueprint;
pub use blueprint::{ContentBlueprintItem, ContentKind, FieldBlueprintItem, InternalFieldKind};
pub mod mailerlite;
pub use mailerlite::TreatmentTemplate;
pub mod submission;
pub use submission::{FieldValue, IntegrationStatus, NormalizedSubmission};
