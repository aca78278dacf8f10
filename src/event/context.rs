use std::sync::Arc;

use tokio::sync::Notify;

use crate::user;

/// Shared state of one socket session; `close` coordinates the split
/// read/write tasks.
#[derive(Clone)]
pub struct Ws {
    pub logged_sub: user::Sub,
    pub close: Arc<Notify>,
}

impl Ws {
    pub fn new(logged_sub: user::Sub) -> Self {
        Self {
            logged_sub,
            close: Arc::new(Notify::new()),
        }
    }
}
