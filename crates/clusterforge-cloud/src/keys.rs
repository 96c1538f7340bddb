//! Parameter and output keys of the Kubernetes stack
//!
//! Shared by the template that declares them and the reconciler that reads
//! them back from described stacks.

/// Stack parameter keys
pub mod params {
    pub const VPC: &str = "VPC";
    pub const SUBNET: &str = "Subnet";
    pub const KEY_NAME: &str = "KeyName";
    pub const CLUSTER_NAME: &str = "ClusterName";
    pub const USERNAME: &str = "Username";
    pub const PASSWORD: &str = "Password";
    pub const CONSUL_DC: &str = "ConsulDC";
    pub const CONSUL_JOIN: &str = "ConsulJoin";
}

/// Stack output keys
pub mod outputs {
    pub const API_SERVER: &str = "APIServer";
    pub const CONSUL_HTTP_API: &str = "ConsulHTTPAPI";
}
