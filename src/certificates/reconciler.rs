//! Stored TLS material reconciliation.
//!
//! # Responsibilities
//! - Compare the assigned certificate/key with what the workload has on disk
//! - Rewrite whichever of the two differs
//!
//! # Design Decisions
//! - Certificate and key are tracked independently: only a differing file is rewritten
//! - Both files are read before anything is written, so an unreachable
//!   workload never leaves a half-updated pair behind from this pass

use serde::Serialize;

use crate::certificates::material::{CertificateAssignment, CertificateMaterial};
use crate::state::TlsPaths;
use crate::workload::storage::{StorageError, WorkloadStorage};

/// Outcome of a certificate reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconciliation {
    /// At least one of certificate or key was rewritten.
    Changed,
    Unchanged,
    /// No relation, or nothing assigned yet. No I/O happened.
    NotReady,
}

impl Reconciliation {
    pub fn is_changed(self) -> bool {
        self == Reconciliation::Changed
    }
}

/// Keeps the workload's certificate and key in line with the assignment.
#[derive(Debug, Clone, Default)]
pub struct CertificateReconciler {
    paths: TlsPaths,
}

impl CertificateReconciler {
    pub fn reconcile<S>(
        &self,
        storage: &mut S,
        assignment: &CertificateAssignment,
    ) -> Result<Reconciliation, StorageError>
    where
        S: WorkloadStorage + ?Sized,
    {
        let material = match assignment {
            CertificateAssignment::RelationAbsent => {
                tracing::warn!("TLS certificate relation not created");
                return Ok(Reconciliation::NotReady);
            }
            CertificateAssignment::Pending => {
                tracing::warn!("Certificate or private key not available");
                return Ok(Reconciliation::NotReady);
            }
            CertificateAssignment::Assigned(material) => material,
        };

        let certificate_updated = self.certificate_updated(&*storage, material)?;
        let private_key_updated = self.private_key_updated(&*storage, material)?;

        if certificate_updated {
            storage.push(&self.paths.cert_path, material.certificate().as_bytes())?;
        }
        if private_key_updated {
            storage.push(&self.paths.key_path, material.private_key().as_bytes())?;
        }

        if certificate_updated || private_key_updated {
            tracing::info!(
                certificate = certificate_updated,
                private_key = private_key_updated,
                "TLS material updated"
            );
            Ok(Reconciliation::Changed)
        } else {
            tracing::debug!("TLS material unchanged");
            Ok(Reconciliation::Unchanged)
        }
    }

    fn certificate_updated<S>(
        &self,
        storage: &S,
        material: &CertificateMaterial,
    ) -> Result<bool, StorageError>
    where
        S: WorkloadStorage + ?Sized,
    {
        Ok(match storage.read_optional(&self.paths.cert_path)? {
            Some(existing) => !material.certificate_matches(&existing),
            None => true,
        })
    }

    fn private_key_updated<S>(
        &self,
        storage: &S,
        material: &CertificateMaterial,
    ) -> Result<bool, StorageError>
    where
        S: WorkloadStorage + ?Sized,
    {
        Ok(match storage.read_optional(&self.paths.key_path)? {
            Some(existing) => !material.private_key_matches(&existing),
            None => true,
        })
    }
}
