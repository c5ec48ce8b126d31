use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "k8s-api-access-exporter")]
#[command(about = "Probe whether each pod's service account can reach the Kubernetes API")]
pub struct Cli {
    /// Only run while the current minute of the hour is below this value
    #[arg(long, env = "RUN_BEFORE_MINUTE", default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(0..=60))]
    pub run_before_minute: u32,

    /// Kubernetes API server URL
    #[arg(long, env = "KUBERNETES_API_SERVER", default_value = "https://kubernetes.default.svc")]
    pub api_server: String,

    /// Bearer token of the exporter's own service account
    #[arg(
        long,
        env = "SERVICE_ACCOUNT_TOKEN_FILE",
        default_value = "/var/run/secrets/kubernetes.io/serviceaccount/token"
    )]
    pub token_file: PathBuf,

    /// CA bundle used when --verify-tls is set
    #[arg(
        long,
        env = "SERVICE_ACCOUNT_CA_FILE",
        default_value = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt"
    )]
    pub ca_file: PathBuf,

    /// Verify the API server certificate against the CA bundle
    #[arg(long, env = "VERIFY_TLS")]
    pub verify_tls: bool,

    /// Prometheus text-exposition file to write
    #[arg(
        short = 'o',
        long,
        env = "METRICS_FILE",
        default_value = "/var/lib/node_exporter/textfile_collector/k8s_api_access.prom"
    )]
    pub output: PathBuf,

    /// Mint a short-lived token when a service account has no token secret
    #[arg(long, env = "TOKEN_REQUEST_FALLBACK")]
    pub token_request_fallback: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
