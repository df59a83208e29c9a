#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::process::Stdio;
    use std::sync::OnceLock;
    use std::time::{Duration, SystemTime};

    use anyhow::{Context, Result, bail};
    use client_sdk::RegistryClient;
    use registry_core::{FormInput, HydrationSource};
    use reqwest::StatusCode;
    use tokio::process::{Child, Command};
    use tokio::time::sleep;

    fn macbook_input() -> FormInput {
        FormInput {
            name: "MacBook Air M2".to_string(),
            memory: "16 GB".to_string(),
            storage: "512 GB".to_string(),
            color: "Midnight".to_string(),
            price: "7800".to_string(),
        }
    }

    #[tokio::test]
    async fn sdk_register_list_delete_roundtrip_against_live_server() -> Result<()> {
        let bind = "127.0.0.1:20080";
        let base_url = format!("http://{bind}");
        let mut server = start_server(bind).await?;

        let result = async {
            let client = RegistryClient::new(&base_url);

            let source = client.hydrate().await?;
            assert_eq!(source, HydrationSource::Remote);
            assert_eq!(client.total().await, 0);

            let record = client.register(macbook_input()).await?;
            assert_eq!(record.name, "MacBook Air M2");
            let details = record.details.as_ref().context("record has no data")?;
            assert_eq!(details.price, Some(7800.0));

            assert_eq!(client.total().await, 1);
            let listed = client.products().await;
            assert_eq!(listed[0].id, record.id);

            let removed = client.delete(&record.id).await?;
            assert!(removed);
            assert_eq!(client.total().await, 0);

            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut server).await;
        result
    }

    #[tokio::test]
    async fn validation_failure_makes_no_network_call() -> Result<()> {
        // No server is running on this port; a request attempt would surface
        // as a transport error instead of the validation message.
        let client = RegistryClient::new("http://127.0.0.1:20099");

        let mut input = macbook_input();
        input.color.clear();

        let err = client.register(input).await.unwrap_err();
        assert_eq!(err.to_string(), "required field is empty: color");
        assert_eq!(client.total().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn deleting_unknown_id_leaves_store_unchanged() -> Result<()> {
        let bind = "127.0.0.1:20081";
        let base_url = format!("http://{bind}");
        let mut server = start_server(bind).await?;

        let result = async {
            let client = RegistryClient::new(&base_url);
            client.hydrate().await?;
            client.register(macbook_input()).await?;

            let err = client.delete("no-such-id").await.unwrap_err();
            assert!(err.to_string().contains("server rejected delete"));
            assert_eq!(client.total().await, 1);

            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut server).await;
        result
    }

    #[tokio::test]
    async fn server_rejects_creation_payload_without_name() -> Result<()> {
        let bind = "127.0.0.1:20082";
        let base_url = format!("http://{bind}");
        let mut server = start_server(bind).await?;

        let result = async {
            let response = reqwest::Client::new()
                .post(format!("{base_url}/objects"))
                .json(&serde_json::json!({ "name": "", "data": {} }))
                .send()
                .await?;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut server).await;
        result
    }

    #[tokio::test]
    async fn cli_register_then_list_roundtrip() -> Result<()> {
        let bind = "127.0.0.1:20083";
        let base_url = format!("http://{bind}");
        let mut server = start_server(bind).await?;

        let result = async {
            let output = run_cli(&[
                "--server-url",
                &base_url,
                "register",
                "--name",
                "MacBook Air M2",
                "--memory",
                "16 GB",
                "--storage",
                "512 GB",
                "--color",
                "Midnight",
                "--price",
                "7800",
            ])
            .await?;
            assert!(output.contains("registered 'MacBook Air M2'"));

            let listing = run_cli(&["--server-url", &base_url, "list"]).await?;
            assert!(listing.contains("MacBook Air M2"));
            assert!(listing.contains("price: 7800"));
            assert!(listing.contains("total products: 1"));

            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut server).await;
        result
    }

    #[tokio::test]
    async fn cli_list_on_empty_registry_reports_zero() -> Result<()> {
        let bind = "127.0.0.1:20084";
        let base_url = format!("http://{bind}");
        let mut server = start_server(bind).await?;

        let result = async {
            let listing = run_cli(&["--server-url", &base_url, "list"]).await?;
            assert!(listing.contains("total products: 0"));

            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut server).await;
        result
    }

    #[tokio::test]
    async fn cli_register_with_empty_field_fails_before_contacting_server() -> Result<()> {
        // Deliberately no server: the CLI must fail with the validation
        // message, not a connection error.
        let cli_bin = binary_path("cli-client")?;
        let output = Command::new(cli_bin)
            .args([
                "--server-url",
                "http://127.0.0.1:20098",
                "register",
                "--name",
                "MacBook Air M2",
            ])
            .output()
            .await
            .context("failed to execute cli-client")?;

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("required field is empty: memory"));

        Ok(())
    }

    #[tokio::test]
    async fn cache_file_hydration_survives_server_shutdown() -> Result<()> {
        let bind = "127.0.0.1:20085";
        let base_url = format!("http://{bind}");
        let mut server = start_server(bind).await?;
        let cache_file = fresh_data_dir("cache-hydration").join("products.json");

        let seeded = async {
            let client = RegistryClient::new(&base_url).with_cache_file(&cache_file);
            client.hydrate().await?;
            client.register(macbook_input()).await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut server).await;
        seeded?;

        // Server is gone; the new session must come up from the cache file.
        let offline = RegistryClient::new(&base_url).with_cache_file(&cache_file);
        let source = offline.hydrate().await?;
        assert_eq!(source, HydrationSource::LocalCache);
        assert_eq!(offline.total().await, 1);
        assert_eq!(offline.products().await[0].name, "MacBook Air M2");

        let _ = fs::remove_dir_all(cache_file.parent().context("cache file has no parent")?);
        Ok(())
    }

    #[tokio::test]
    async fn cli_web_interface_ping() -> Result<()> {
        let bind = "127.0.0.1:20086";
        let mut cli_web = start_cli_web(bind).await?;

        let ping_url = format!("http://{bind}/api/ping");
        let body = reqwest::get(&ping_url)
            .await
            .context("failed to call cli web ping endpoint")?
            .error_for_status()
            .context("cli web ping endpoint returned non-success status")?
            .text()
            .await
            .context("failed to read ping response body")?;

        assert!(body.contains("\"ok\":true"));
        assert!(body.contains("cli-client-web"));

        stop_server(&mut cli_web).await;
        Ok(())
    }

    #[tokio::test]
    async fn web_form_submit_and_delete_roundtrip() -> Result<()> {
        let server_bind = "127.0.0.1:20087";
        let web_bind = "127.0.0.1:20088";
        let mut server = start_server(server_bind).await?;
        let mut cli_web = start_cli_web_with_server(web_bind, server_bind).await?;

        let result = async {
            let http = reqwest::Client::new();
            let web_url = format!("http://{web_bind}");

            let invalid = http
                .post(format!("{web_url}/api/products"))
                .json(&serde_json::json!({ "name": "MacBook Air M2" }))
                .send()
                .await?;
            assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

            let created = http
                .post(format!("{web_url}/api/products"))
                .json(&serde_json::json!({
                    "name": "MacBook Air M2",
                    "memory": "16 GB",
                    "storage": "512 GB",
                    "color": "Midnight",
                    "price": "7800"
                }))
                .send()
                .await?
                .error_for_status()?
                .json::<serde_json::Value>()
                .await?;
            assert_eq!(created["data"]["price"], 7800.0);

            let id = created["id"].as_str().context("missing id")?;
            let deleted = http
                .delete(format!("{web_url}/api/products/{id}"))
                .send()
                .await?;
            assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

            let listed = http
                .get(format!("{web_url}/api/products"))
                .send()
                .await?
                .error_for_status()?
                .json::<serde_json::Value>()
                .await?;
            assert_eq!(listed.as_array().map(|a| a.len()), Some(0));

            Ok::<(), anyhow::Error>(())
        }
        .await;

        stop_server(&mut cli_web).await;
        stop_server(&mut server).await;
        result
    }

    async fn start_server(bind: &str) -> Result<Child> {
        let data_dir = fresh_data_dir("server");
        start_server_with_data_dir(bind, &data_dir).await
    }

    async fn start_server_with_data_dir(bind: &str, data_dir: &Path) -> Result<Child> {
        let server_bin = binary_path("server-node")?;

        let child = Command::new(server_bin)
            .env("STOCKROOM_SERVER_BIND", bind)
            .env("STOCKROOM_DATA_DIR", data_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn server-node")?;

        wait_for_server(bind, 40).await?;
        Ok(child)
    }

    async fn run_cli(args: &[&str]) -> Result<String> {
        let cli_bin = binary_path("cli-client")?;
        let output = Command::new(cli_bin)
            .args(args)
            .output()
            .await
            .context("failed to execute cli-client")?;

        if !output.status.success() {
            bail!(
                "cli-client failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn start_cli_web(bind: &str) -> Result<Child> {
        start_cli_web_with_server(bind, "127.0.0.1:20097").await
    }

    async fn start_cli_web_with_server(bind: &str, server_bind: &str) -> Result<Child> {
        let cli_bin = binary_path("cli-client")?;

        let child = Command::new(cli_bin)
            .arg("--server-url")
            .arg(format!("http://{server_bind}"))
            .arg("serve-web")
            .arg("--bind")
            .arg(bind)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn cli-client serve-web")?;

        wait_for_url_status(&format!("http://{bind}/api/ping"), StatusCode::OK, 40).await?;
        Ok(child)
    }

    async fn wait_for_server(bind: &str, retries: usize) -> Result<()> {
        let health_url = format!("http://{bind}/health");
        wait_for_url_status(&health_url, StatusCode::OK, retries).await
    }

    async fn wait_for_url_status(url: &str, expected: StatusCode, retries: usize) -> Result<()> {
        let http = reqwest::Client::new();

        for _ in 0..retries {
            if let Ok(resp) = http.get(url).send().await
                && resp.status() == expected
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }

        bail!("service did not return {expected} at {url}");
    }

    async fn stop_server(child: &mut Child) {
        let _ = child.kill().await;
        let _ = child.wait().await;
    }

    fn binary_path(name: &str) -> Result<PathBuf> {
        let workspace_root = workspace_root()?;
        ensure_binaries_built(&workspace_root)?;
        let mut path = workspace_root.join("target").join("debug").join(name);

        if let Some(suffix) = std::env::consts::EXE_SUFFIX.strip_prefix('.') {
            let mut filename = OsString::from(name);
            filename.push(".");
            filename.push(suffix);
            path = workspace_root.join("target").join("debug").join(filename);
        }

        if !path.exists() {
            bail!("expected binary does not exist: {}", path.display());
        }

        Ok(path)
    }

    fn workspace_root() -> Result<PathBuf> {
        let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        crate_dir
            .parent()
            .and_then(|p| p.parent())
            .map(PathBuf::from)
            .context("failed to resolve workspace root")
    }

    fn build_required_binaries(workspace_root: &PathBuf) -> Result<()> {
        let status = std::process::Command::new("cargo")
            .arg("build")
            .arg("-p")
            .arg("server-node")
            .arg("-p")
            .arg("cli-client")
            .current_dir(workspace_root)
            .status()
            .context("failed to run cargo build for system test binaries")?;

        if !status.success() {
            bail!("cargo build for system test binaries failed");
        }

        Ok(())
    }

    fn ensure_binaries_built(workspace_root: &PathBuf) -> Result<()> {
        static BUILD_RESULT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

        let result = BUILD_RESULT.get_or_init(|| {
            build_required_binaries(workspace_root).map_err(|err| err.to_string())
        });

        if let Err(message) = result {
            bail!("failed to build required binaries: {message}");
        }

        Ok(())
    }

    fn fresh_data_dir(name: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("stockroom-{name}-{unique}"));
        let _ = fs::remove_dir_all(&path);
        let _ = fs::create_dir_all(&path);
        path
    }
}
