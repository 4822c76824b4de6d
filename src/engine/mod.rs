mod error;

pub use error::ApiError;

use crate::model::{
    ClientConfig, DeleteResponse, OutputFile, OutputFileList, UploadRequest, UploadResult,
};
use error::extract_error_message;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Typed access to the upload and file registry endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
        })
    }

    /// Build `<base>/<segments...>`; each segment is percent-encoded on its own,
    /// so a name containing `/` stays a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Url(self.base_url.to_string()))?;
            path.pop_if_empty();
            for s in segments {
                path.push(s);
            }
        }
        Ok(url)
    }

    /// Resolve a registry download locator against the base URL.
    pub fn resolve(&self, href: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(href)
            .map_err(|e| ApiError::Url(format!("{href}: {e}")))
    }

    pub async fn list_output_files(&self) -> Result<Vec<OutputFile>, ApiError> {
        let url = self.endpoint(&["output_files"])?;
        debug!(%url, "listing output files");
        let resp = self.http.get(url).send().await?;
        let list: OutputFileList = decode(resp, "output_files").await?;
        Ok(list.files)
    }

    pub async fn upload(&self, req: &UploadRequest) -> Result<UploadResult, ApiError> {
        let url = self.endpoint(&["upload"])?;
        let mut form = Form::new();
        for f in &req.files {
            form = form.part(
                "files",
                Part::bytes(f.data.to_vec()).file_name(f.name.clone()),
            );
        }
        form = form
            .text("generate_excel", req.generate_excel.to_string())
            .text("generate_ppt", req.generate_ppt.to_string());

        debug!(
            %url,
            files = req.files.len(),
            excel = req.generate_excel,
            ppt = req.generate_ppt,
            "uploading"
        );
        let resp = self.http.post(url).multipart(form).send().await?;
        decode(resp, "upload").await
    }

    pub async fn delete_file(&self, name: &str) -> Result<DeleteResponse, ApiError> {
        let url = self.endpoint(&["delete_file", name])?;
        debug!(%url, "deleting output file");
        let resp = check_status(self.http.delete(url).send().await?).await?;
        let body = resp.bytes().await?;
        // The success body is informational only; an unexpected shape is not a failure.
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }

    /// Stream `href` into `dest`, returning the number of bytes written.
    ///
    /// The body lands in a `.part` sibling first and only replaces `dest` once it has
    /// been received completely; an existing file at `dest` survives any failure.
    pub async fn download(&self, href: &str, dest: &Path) -> Result<u64, ApiError> {
        let url = self.resolve(href)?;
        debug!(%url, dest = %dest.display(), "downloading");
        let resp = check_status(self.http.get(url).send().await?).await?;

        let partial = partial_path(dest);
        let res = async {
            let written = write_body(resp, &partial).await?;
            tokio::fs::rename(&partial, dest).await?;
            Ok::<_, ApiError>(written)
        }
        .await;
        if res.is_err() {
            let _ = tokio::fs::remove_file(&partial).await;
        }
        res
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_body(resp: Response, to: &Path) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(to).await?;
    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    Err(ApiError::Server {
        status,
        message: extract_error_message(&body),
    })
}

async fn decode<T: DeserializeOwned>(resp: Response, endpoint: &'static str) -> Result<T, ApiError> {
    let resp = check_status(resp).await?;
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|source| ApiError::Decode { endpoint, source })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{FileKind, UploadFile};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_config(base: &str) -> ClientConfig {
        ClientConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(5),
            required_extension: "json".into(),
            user_agent: "transcript-upload-cli/test".into(),
            download_dir: std::env::temp_dir(),
        }
    }

    #[tokio::test]
    async fn lists_files_in_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/output_files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [
                    {"name": "b.pptx", "path": "/download/b.pptx", "type": "ppt"},
                    {"name": "a.xlsx", "path": "/download/a.xlsx", "type": "excel"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        let files = client.list_output_files().await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "b.pptx");
        assert_eq!(files[1].kind, FileKind::Excel);
    }

    #[tokio::test]
    async fn malformed_listing_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/output_files"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        let err = client.list_output_files().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn upload_sends_files_and_flags_as_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "messages": ["processed 2 files"],
                "files": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        let req = UploadRequest {
            files: vec![
                UploadFile::new("one.json", br#"{"a":1}"#.to_vec()),
                UploadFile::new("two.json", br#"{"b":2}"#.to_vec()),
            ],
            generate_excel: true,
            generate_ppt: false,
        };
        let result = client.upload(&req).await.unwrap();
        assert_eq!(result.messages, vec!["processed 2 files".to_string()]);

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body).to_string();
        assert_eq!(body.matches("name=\"files\"").count(), 2);
        assert!(body.contains("filename=\"one.json\""));
        assert!(body.contains("filename=\"two.json\""));
        assert!(body.contains("name=\"generate_excel\"\r\n\r\ntrue"));
        assert!(body.contains("name=\"generate_ppt\"\r\n\r\nfalse"));
    }

    #[tokio::test]
    async fn upload_failure_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "unsupported type"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        let req = UploadRequest {
            files: vec![UploadFile::new("a.json", b"{}".to_vec())],
            generate_excel: true,
            generate_ppt: true,
        };
        match client.upload(&req).await.unwrap_err() {
            ApiError::Server { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message.as_deref(), Some("unsupported type"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_escapes_name_as_one_segment() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/delete_file/case%201%2Fa.pptx"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        let resp = client.delete_file("case 1/a.pptx").await.unwrap();
        assert_eq!(resp.success, Some(true));
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/output_files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&test_config(&format!("{}/app/", server.uri()))).unwrap();
        assert!(client.list_output_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_streams_body_to_disk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/a.xlsx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.xlsx");
        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        let n = client.download("/download/a.xlsx", &dest).await.unwrap();
        assert_eq!(n, 4096);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn truncated_download_keeps_previous_copy() {
        use tokio::io::AsyncReadExt;

        // Promises a large body, sends a fraction of it, then hangs up.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            sock.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\n\r\n")
                .await
                .unwrap();
            sock.write_all(&[7u8; 1000]).await.unwrap();
            sock.flush().await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.xlsx");
        std::fs::write(&dest, "previous good copy").unwrap();

        let client = ApiClient::new(&test_config(&format!("http://{addr}"))).unwrap();
        assert!(client.download("/download/a.xlsx", &dest).await.is_err());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous good copy");
        assert!(!partial_path(&dest).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn completed_download_replaces_existing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/a.xlsx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.xlsx");
        std::fs::write(&dest, "stale").unwrap();

        let client = ApiClient::new(&test_config(&server.uri())).unwrap();
        client.download("/download/a.xlsx", &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "fresh");
        assert!(!partial_path(&dest).exists());
    }
}
