use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

use super::{SceneError, SceneResult};

/// Pixel dimensions of a preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug)]
struct SurfaceInner {
    size: SurfaceSize,
    owner: Option<Uuid>,
    listeners: HashMap<ListenerId, Sender<SurfaceSize>>,
    next_listener: u64,
}

/// Mount target for the avatar preview.
///
/// The UI owns the surface and reports layout changes through
/// [`set_size`](Self::set_size); a mounted renderer receives them through the
/// resize listener it registers. At most one renderer is bound at a time.
#[derive(Debug, Clone)]
pub struct PreviewSurface {
    inner: Arc<Mutex<SurfaceInner>>,
}

impl PreviewSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SurfaceInner {
                size,
                owner: None,
                listeners: HashMap::new(),
                next_listener: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn size(&self) -> SurfaceSize {
        self.lock().size
    }

    /// Record a new layout size. Listeners are notified only on change.
    pub fn set_size(&self, size: SurfaceSize) {
        let mut inner = self.lock();
        if inner.size == size {
            return;
        }
        inner.size = size;
        // Drop listeners whose receiving end is gone
        inner.listeners.retain(|_, tx| tx.send(size).is_ok());
    }

    pub fn add_listener(&self) -> (ListenerId, Receiver<SurfaceSize>) {
        let (tx, rx) = unbounded();
        let mut inner = self.lock();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.insert(id, tx);
        debug!("Registered resize listener {:?}", id);
        (id, rx)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.lock().listeners.remove(&id).is_some();
        if removed {
            debug!("Removed resize listener {:?}", id);
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn bind(&self, owner: Uuid) -> SceneResult<()> {
        let mut inner = self.lock();
        match inner.owner {
            Some(current) if current != owner => Err(SceneError::SurfaceInUse { owner: current }),
            _ => {
                inner.owner = Some(owner);
                Ok(())
            }
        }
    }

    /// Release the binding if `owner` holds it
    pub fn unbind(&self, owner: Uuid) {
        let mut inner = self.lock();
        if inner.owner == Some(owner) {
            inner.owner = None;
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lock().owner.is_some()
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.lock().owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_receives_changes_only() {
        let surface = PreviewSurface::new(SurfaceSize::new(100, 100));
        let (id, rx) = surface.add_listener();

        surface.set_size(SurfaceSize::new(100, 100));
        assert!(rx.try_recv().is_err());

        surface.set_size(SurfaceSize::new(200, 150));
        assert_eq!(rx.try_recv().unwrap(), SurfaceSize::new(200, 150));

        assert!(surface.remove_listener(id));
        assert!(!surface.remove_listener(id));
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let surface = PreviewSurface::new(SurfaceSize::new(10, 10));
        let (_, rx) = surface.add_listener();
        drop(rx);
        surface.set_size(SurfaceSize::new(20, 20));
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_single_owner() {
        let surface = PreviewSurface::new(SurfaceSize::new(10, 10));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        surface.bind(a).unwrap();
        surface.bind(a).unwrap();
        assert_eq!(surface.bind(b), Err(SceneError::SurfaceInUse { owner: a }));

        surface.unbind(b);
        assert_eq!(surface.owner(), Some(a));
        surface.unbind(a);
        assert!(!surface.is_bound());
        surface.bind(b).unwrap();
    }
}
