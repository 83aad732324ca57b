pub mod blueprint_service;
pub mod document_service;
pub use document_service::DocumentService;
pub mod mailerlite_service;
pub use mailerlite_service::MailerLiteService;
pub mod normalizer;
pub mod notification_service;
pub use notification_service::NotificationService;
pub mod submission_service;
pub use submission_service::SubmissionService;
