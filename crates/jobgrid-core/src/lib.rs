//! # jobgrid-core
//!
//! Declarative reconciliation core for the Jobgrid command-line client.
//!
//! Given a desired-state list of job definitions and the live state reported
//! by the Jobgrid API, this crate computes the minimal set of creates,
//! deletes, and recreates needed to converge live state to desired state,
//! and drives those operations in a safe order. Jobs cannot be updated in
//! place, so "modify" always means delete followed by recreate.
//!
//! The crate performs no network I/O of its own. The caller fetches both
//! collections and hands them to [`calculate_changes`]; the resulting
//! [`ChangeSet`] is consumed by [`apply`], which talks to the platform only
//! through the [`JobService`] trait.
//!
//! ## Example
//!
//! ```ignore
//! use jobgrid_core::{apply, calculate_changes, ApplyOptions, JobService};
//!
//! async fn load(service: &dyn JobService, desired: &[jobgrid_core::DesiredJobSpec])
//! -> Result<(), jobgrid_core::ApplyError> {
//!     let live = fetch_live_jobs().await?;
//!     let changes = calculate_changes(desired, &live, None);
//!     apply(service, &changes, desired, ApplyOptions::default()).await
//! }
//! ```

mod apply;
mod equivalence;
mod error;
mod model;
mod reconcile;

pub use apply::{ApplyOptions, JobService, apply};
pub use equivalence::is_equivalent;
pub use error::{ApplyError, ServiceError};
pub use model::{DesiredJobSpec, EmailPolicy, JobKind, LiveJobRecord, NormalizedView};
pub use reconcile::{ChangeSet, calculate_changes};

/// Type alias for a collaborator result.
pub type ServiceResult<T> = Result<T, ServiceError>;
