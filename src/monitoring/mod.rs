/*!
 * Monitoring Module
 * Structured logging bootstrap
 */

mod tracer;

pub use tracer::{init_tracing, OperationSpan};
