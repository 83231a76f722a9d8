//! Shadow state: `ShadowVar`, `ShadowThread` + tid-reuse table, and
//! sync-object state.

pub mod shadow_var;
pub mod sync_state;
pub mod thread_state;

pub use shadow_var::{ShadowVar, ShadowVarGuard};
pub use sync_state::{BarrierState, BarrierTable, ObjectId, SyncTable};
pub use thread_state::{MaxEpochTable, ShadowThread};
