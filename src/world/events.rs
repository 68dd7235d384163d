use std::time::SystemTime;

use uuid::Uuid;

use crate::catalog::AvatarItem;

/// Events sent from background upload tasks back to the UI thread

/// Upload finished and produced a new wardrobe item
#[derive(Debug, Clone)]
pub struct UploadCompleteEvent {
    pub ticket: Uuid,
    pub item: AvatarItem,
    pub timestamp: SystemTime,
}

/// Upload task ended without producing an item
#[derive(Debug, Clone)]
pub struct UploadFailedEvent {
    pub ticket: Uuid,
    pub reason: String,
    pub timestamp: SystemTime,
}

#[derive(Debug, Clone)]
pub enum UploadEvent {
    Complete(UploadCompleteEvent),
    Failed(UploadFailedEvent),
}

impl UploadEvent {
    pub fn complete(ticket: Uuid, item: AvatarItem) -> Self {
        UploadEvent::Complete(UploadCompleteEvent {
            ticket,
            item,
            timestamp: SystemTime::now(),
        })
    }

    pub fn failed(ticket: Uuid, reason: impl Into<String>) -> Self {
        UploadEvent::Failed(UploadFailedEvent {
            ticket,
            reason: reason.into(),
            timestamp: SystemTime::now(),
        })
    }

    pub fn ticket(&self) -> Uuid {
        match self {
            UploadEvent::Complete(e) => e.ticket,
            UploadEvent::Failed(e) => e.ticket,
        }
    }
}
