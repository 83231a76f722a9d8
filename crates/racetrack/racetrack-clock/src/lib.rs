//! Epoch and vector-clock primitives shared by the rest of the engine.

pub mod atomic_vector_clock;
pub mod epoch;
pub mod vector_clock;

pub use atomic_vector_clock::AtomicVectorClock;
pub use epoch::{Clk, Epoch, LongEpoch, Tid};
pub use vector_clock::VectorClock;
