use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    /// Project endpoint of the hosted store, e.g. "https://<ref>.supabase.co".
    pub store_url: Url,
    /// Anonymous-role key. Sent as `apikey` and bearer token; never logged.
    pub store_anon_key: SecretString,
    pub primary_table: String,
    /// Degraded-mode target used when the primary table can't be provisioned.
    pub fallback_table: String,
    /// Call the table-ensuring RPC before each insert. The RPC only creates
    /// `waitlist`, so it is skipped for any other primary table.
    pub pre_provision: bool,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let store_url: Url = get_env("WAITLIST_STORE_URL");
        let store_anon_key = SecretString::new(get_env::<String>("WAITLIST_STORE_ANON_KEY").into());
        let primary_table: String = get_env_default("WAITLIST_PRIMARY_TABLE", "waitlist".to_string());
        let fallback_table: String = get_env_default("WAITLIST_FALLBACK_TABLE", "users".to_string());
        let pre_provision: bool = get_env_default("WAITLIST_PRE_PROVISION", true);
        let http_timeout_secs: u64 = get_env_default("WAITLIST_HTTP_TIMEOUT_SECS", 30);

        Self {
            store_url,
            store_anon_key,
            primary_table,
            fallback_table,
            pre_provision,
            http_timeout_secs,
        }
    }
}
