/// Registry address used when none is configured
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8500";

/// Agent endpoint accepting service registrations (PUT, JSON body)
pub const REGISTER_PATH: &str = "/v1/agent/service/register";

/// Agent endpoint removing a service, followed by the service ID (PUT)
pub const DEREGISTER_PATH: &str = "/v1/agent/service/deregister";

/// Health endpoint, followed by the service name (GET)
pub const HEALTH_SERVICE_PATH: &str = "/v1/health/service";

/// Check status values reported by the registry
pub const CHECK_PASSING: &str = "passing";
pub const CHECK_WARNING: &str = "warning";
pub const CHECK_CRITICAL: &str = "critical";
pub const CHECK_MAINTENANCE: &str = "maintenance";
