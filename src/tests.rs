#[cfg(test)]
mod tests {
    use crate::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use mockito::Matcher;
    use serde_json::json;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("transcode_studio=debug")
            .with_test_writer()
            .try_init();
    }

    // 真实 HTTP 客户端 + 模拟后端
    async fn mock_backend(server: &mut mockito::Server) -> Vec<mockito::Mock> {
        let presigned = json!({
            "presignedUrl": format!("{}/bucket/clip.mp4?X-Amz-Signature=sig", server.url()),
            "s3key": "uploads/clip.mp4",
            "videoId": "42",
        });

        let calls = Arc::new(Mutex::new(0usize));
        let status = server
            .mock("GET", "/api/videos/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                let status = if *calls == 1 { "PROCESSING" } else { "PROCESSED" };
                json!({
                    "id": 42,
                    "originalFileName": "clip.mp4",
                    "s3Key": "uploads/clip.mp4",
                    "contentType": "video/mp4",
                    "status": status,
                })
                .to_string()
                .into_bytes()
            })
            .expect(2)
            .create_async()
            .await;

        vec![
            server
                .mock("POST", "/api/video/upload-url")
                .match_body(Matcher::Json(json!({"fileName": "clip.mp4", "contentType": "video/mp4"})))
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(presigned.to_string())
                .expect(1)
                .create_async()
                .await,
            server
                .mock("PUT", "/bucket/clip.mp4")
                .match_query(Matcher::UrlEncoded("X-Amz-Signature".into(), "sig".into()))
                .match_header("content-type", "video/mp4")
                .with_status(200)
                .expect(1)
                .create_async()
                .await,
            status,
            server
                .mock("GET", "/api/video/42/download")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(
                    json!({
                        "videoId": 42,
                        "status": "PROCESSED",
                        "message": "Ready",
                        "variants": [
                            {"quality": "1080p", "url": "https://cdn/42/1080p.mp4", "contentType": "video/mp4"},
                            {"quality": "Master", "url": "https://cdn/42/master.m3u8", "contentType": "application/x-mpegURL"},
                            {"quality": "poster", "url": "https://cdn/42/thumb.jpg", "contentType": "image/jpeg"}
                        ]
                    })
                    .to_string(),
                )
                .expect(1)
                .create_async()
                .await,
        ]
    }

    #[tokio::test]
    async fn test_upload_to_playable_over_http() {
        init_tracing();

        let mut server = mockito::Server::new_async().await;
        let mocks = mock_backend(&mut server).await;

        let api = ApiClient::new(&ApiConfig::with_base_url(Some(&server.url()))).unwrap();
        let config = UploadConfig {
            poll_interval: Duration::from_millis(20),
            ..Default::default()
        };
        let handle = UploadManager::new(Arc::new(api), config);
        let manager = handle.manager.clone();
        let mut events = manager.subscribe_events();

        let file = UploadFile::from_bytes("clip.mp4", "video/mp4", vec![3u8; 256 * 1024]);
        let job_id = manager.submit(file).await.unwrap();
        assert_eq!(job_id, JobId::from(42));

        let mut saw_progress = false;
        let ready = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match events.recv().await.unwrap() {
                    UploadEvent::UploadProgress { .. } => saw_progress = true,
                    UploadEvent::VariantsChanged { state: VariantsState::Ready, .. } => break,
                    UploadEvent::VariantsChanged { state: VariantsState::Error, .. } => return false,
                    _ => {}
                }
            }
            true
        })
        .await
        .unwrap();
        assert!(ready);
        assert!(saw_progress);

        let job = manager.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Processed);
        assert_eq!(job.progress, Some(100.0));
        assert_eq!(job.master_url.as_deref(), Some("https://cdn/42/master.m3u8"));
        assert_eq!(job.thumbnail_url.as_deref(), Some("https://cdn/42/thumb.jpg"));
        assert!(manager.active_pollers().await.unwrap().is_empty());

        // 终态后不再请求
        tokio::time::sleep(Duration::from_millis(100)).await;
        for mock in &mocks {
            mock.assert_async().await;
        }

        handle.shutdown().await.unwrap();
    }
}
