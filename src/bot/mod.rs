/// Command and text-message handlers
pub mod handlers;
