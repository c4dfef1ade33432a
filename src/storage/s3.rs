use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use super::{
    CompletedPart, ObjectStore, StorageError,
    sigv4::{self, Credentials, PresignRequest},
};
use crate::config::StorageConfig;

/// S3 (or S3-compatible) bucket, addressed with presigned URLs only.
pub struct S3Store {
    config: StorageConfig,
    http: reqwest::Client,
}

struct Target {
    base: String,
    host: String,
    path: String,
}

impl S3Store {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Virtual-hosted style on AWS, path style on a custom endpoint.
    fn target(&self, key: &str) -> Result<Target, StorageError> {
        let key = sigv4::encode_path(key.trim_start_matches('/'));

        match &self.config.endpoint {
            Some(endpoint) => {
                let url = Url::parse(endpoint)?;
                let host = match (url.host_str(), url.port()) {
                    (Some(host), Some(port)) => format!("{host}:{port}"),
                    (Some(host), None) => host.to_owned(),
                    (None, _) => return Err(StorageError::Endpoint(url::ParseError::EmptyHost)),
                };

                Ok(Target {
                    base: format!("{}://{host}", url.scheme()),
                    host,
                    path: format!("/{}/{key}", self.config.bucket),
                })
            }
            None => {
                let host = if self.config.region == "us-east-1" {
                    format!("{}.s3.amazonaws.com", self.config.bucket)
                } else {
                    format!("{}.s3.{}.amazonaws.com", self.config.bucket, self.config.region)
                };

                Ok(Target {
                    base: format!("https://{host}"),
                    host,
                    path: format!("/{key}"),
                })
            }
        }
    }

    fn presign(
        &self,
        method: &str,
        key: &str,
        params: &[(&str, String)],
        ttl: Duration,
    ) -> Result<String, StorageError> {
        if !self.config.is_configured() {
            return Err(StorageError::NotConfigured);
        }

        let target = self.target(key)?;
        let credentials = Credentials {
            access_key_id: &self.config.access_key_id,
            secret_access_key: &self.config.secret_access_key,
            region: &self.config.region,
        };
        let request = PresignRequest {
            method,
            host: &target.host,
            path: &target.path,
            params,
            expires_secs: ttl.as_secs(),
        };

        let query = sigv4::presign_query(&credentials, &request, Utc::now())?;

        Ok(format!("{}{}?{query}", target.base, target.path))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, StorageError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.presign("GET", key, &[], ttl)
    }

    fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        self.presign("PUT", key, &[], ttl)
    }

    async fn create_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = self.presign("POST", key, &[("uploads", String::new())], Duration::from_secs(300))?;

        let body = self
            .send(
                self.http
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, content_type),
            )
            .await?;

        if body.contains("<Error>") {
            return Err(StorageError::Rejected { status: 200, body });
        }

        xml_value(&body, "UploadId")
            .filter(|upload_id| !upload_id.is_empty())
            .ok_or_else(|| StorageError::InvalidResponse("missing UploadId".to_owned()))
    }

    fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        self.presign(
            "PUT",
            key,
            &[
                ("partNumber", part_number.to_string()),
                ("uploadId", upload_id.to_owned()),
            ],
            ttl,
        )
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StorageError> {
        let url = self.presign(
            "POST",
            key,
            &[("uploadId", upload_id.to_owned())],
            Duration::from_secs(300),
        )?;

        let body = self
            .send(
                self.http
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, "application/xml")
                    .body(complete_body(parts)),
            )
            .await?;

        // S3 can answer 200 with an error document
        if body.contains("<Error>") {
            return Err(StorageError::Rejected { status: 200, body });
        }

        Ok(())
    }

    fn object_url(&self, key: &str) -> Result<String, StorageError> {
        let target = self.target(key)?;

        Ok(format!("{}{}", target.base, target.path))
    }
}

fn complete_body(parts: &[CompletedPart]) -> String {
    let mut sorted = parts.to_vec();
    sorted.sort_by_key(|part| part.part_number);

    let parts: String = sorted
        .iter()
        .map(|part| {
            format!(
                "<Part><PartNumber>{}</PartNumber><ETag>&quot;{}&quot;</ETag></Part>",
                part.part_number,
                xml_escape(part.etag.trim_matches('"'))
            )
        })
        .collect();

    format!("<CompleteMultipartUpload>{parts}</CompleteMultipartUpload>")
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn xml_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Text of the first `<tag>` element. Elements with children or a second
/// occurrence of the tag are treated as malformed.
fn xml_value(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    let text = &body[start..end];

    if text.contains('<') || body[end..].contains(&open) {
        return None;
    }

    Some(xml_unescape(text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(endpoint: Option<&str>) -> S3Store {
        S3Store::new(StorageConfig {
            access_key_id: "AKIDEXAMPLE".to_owned(),
            secret_access_key: "secret".to_owned(),
            endpoint: endpoint.map(str::to_owned),
            ..StorageConfig::default()
        })
    }

    #[test]
    fn test_unconfigured_store_refuses_to_sign() {
        let store = S3Store::new(StorageConfig::default());

        assert!(matches!(
            store.presign_get("a.mp4", Duration::from_secs(60)),
            Err(StorageError::NotConfigured)
        ));
    }

    #[test]
    fn test_aws_urls_are_virtual_hosted() {
        let url = store(None)
            .presign_get("matches/m1/video/final.mp4", Duration::from_secs(3600))
            .unwrap();

        assert!(url.starts_with(
            "https://unicorn-sport-media.s3.amazonaws.com/matches/m1/video/final.mp4?"
        ));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[test]
    fn test_custom_endpoint_is_path_style() {
        let url = store(Some("http://localhost:9000"))
            .presign_part("a.mp4", "upload-1", 3, Duration::from_secs(60))
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/unicorn-sport-media/a.mp4?"));
        assert!(url.contains("partNumber=3"));
        assert!(url.contains("uploadId=upload-1"));
    }

    #[test]
    fn test_object_url_is_unsigned() {
        let url = store(Some("http://localhost:9000"))
            .object_url("thumbnails/matches/m1/cover.jpg")
            .unwrap();

        assert_eq!(
            url,
            "http://localhost:9000/unicorn-sport-media/thumbnails/matches/m1/cover.jpg"
        );
    }

    #[test]
    fn test_complete_body_orders_parts() {
        let body = complete_body(&[
            CompletedPart {
                part_number: 2,
                etag: "\"b\"".to_owned(),
            },
            CompletedPart {
                part_number: 1,
                etag: "a".to_owned(),
            },
        ]);

        assert_eq!(
            body,
            "<CompleteMultipartUpload><Part><PartNumber>1</PartNumber><ETag>&quot;a&quot;</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>&quot;b&quot;</ETag></Part></CompleteMultipartUpload>"
        );
    }

    #[test]
    fn test_upload_id_is_read_from_xml() {
        let body = "<InitiateMultipartUploadResult><Bucket>b</Bucket><UploadId>abc123</UploadId></InitiateMultipartUploadResult>";

        assert_eq!(xml_value(body, "UploadId").as_deref(), Some("abc123"));
        assert_eq!(xml_value(body, "Missing"), None);
    }

    #[test]
    fn test_etag_markup_is_escaped() {
        let body = complete_body(&[CompletedPart {
            part_number: 1,
            etag: "x</ETag></Part><Part><PartNumber>9</PartNumber><ETag>y".to_owned(),
        }]);

        assert_eq!(body.matches("<Part>").count(), 1);
        assert!(!body.contains("<PartNumber>9"));
        assert!(body.contains("x&lt;/ETag&gt;"));
    }

    #[test]
    fn test_nested_or_repeated_tags_are_rejected() {
        assert_eq!(
            xml_value("<R><UploadId><UploadId>a</UploadId></UploadId></R>", "UploadId"),
            None
        );
        assert_eq!(
            xml_value("<R><UploadId>a</UploadId><UploadId>b</UploadId></R>", "UploadId"),
            None
        );
        assert_eq!(
            xml_value("<R><UploadId>a&amp;b</UploadId></R>", "UploadId").as_deref(),
            Some("a&b")
        );
    }
}
