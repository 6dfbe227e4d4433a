use std::fmt::Debug;

use futures::stream::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A value slot that can be watched for changes.
///
/// Writers go through the crate; readers get a snapshot or a stream that
/// yields the current value first and every change after it.
#[derive(Clone)]
pub struct Property<T: Clone + Send + Sync + 'static> {
    tx: watch::Sender<T>,
    rx: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Create a property holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, rx }
    }

    /// Store a new value, notifying watchers if it differs.
    pub(crate) fn set(&self, new_value: T)
    where
        T: PartialEq,
    {
        self.update(|current| {
            if *current == new_value {
                return false;
            }
            *current = new_value;
            true
        });
    }

    /// Modify the value in place.
    ///
    /// `modify` returns whether it changed anything; watchers are only
    /// notified when it did. The check and the write happen under one lock.
    pub(crate) fn update(&self, modify: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(modify)
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Stream of values, starting with the current one.
    pub fn watch(&self) -> impl Stream<Item = T> + Send {
        WatchStream::new(self.rx.clone())
    }
}

impl<T: Clone + Send + Sync + Debug + 'static> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}
