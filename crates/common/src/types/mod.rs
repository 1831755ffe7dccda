use serde::{Deserialize, Serialize};

/// Body of `GET /healthz`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub ok: bool,
}

impl Health {
    pub fn ok() -> Self { Self { ok: true } }
}
