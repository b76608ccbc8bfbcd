/// Database layer for AssignPay
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health check
/// - `migrations`: Embedded migration runner
///
/// Models are in the `models` module at crate root level; the storage
/// traits that the submission workflow talks to are in `store`.

pub mod migrations;
pub mod pool;
