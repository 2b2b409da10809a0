use crate::HealthRes;

/// Liveness report for the REST server's `/health` route.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static health check; needs no instance.
    ///
    /// # Returns
    /// A `HealthRes` reporting the service as alive.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "AYUSH terminology client is alive".into(),
        }
    }
}
