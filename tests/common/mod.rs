use mockito::Server;
use serde_json::json;

pub struct MockAcmeServer {
    pub server: mockito::ServerGuard,
}

impl MockAcmeServer {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    pub async fn mock_directory(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("GET", "/directory")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "newNonce": format!("{}/new-nonce", url),
                    "newAccount": format!("{}/new-account", url),
                    "newOrder": format!("{}/new-order", url),
                    "revokeCert": format!("{}/revoke-cert", url),
                    "keyChange": format!("{}/key-change", url),
                    "meta": {
                        "termsOfService": "https://example.com/tos"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_new_nonce(&mut self) -> mockito::Mock {
        self.server
            .mock("HEAD", "/new-nonce")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-123")
            .create_async()
            .await
    }

    pub async fn mock_new_account(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/new-account")
            .with_status(201)
            .with_header("location", &format!("{}/account/1", url))
            .with_header("replay-nonce", "test-nonce-124")
            .with_body(
                json!({
                    "status": "valid",
                    "contact": ["mailto:admin@example.com"],
                    "orders": format!("{}/account/1/orders", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_account_update(&mut self, contacts: &[&str]) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/account/1")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-125")
            .with_body(
                json!({
                    "status": "valid",
                    "contact": contacts,
                    "orders": format!("{}/account/1/orders", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_new_order(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/new-order")
            .with_status(201)
            .with_header("location", &format!("{}/order/1", url))
            .with_header("replay-nonce", "test-nonce-126")
            .with_body(
                json!({
                    "status": "pending",
                    "expires": "2026-02-10T00:00:00Z",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/authz/1", url)],
                    "finalize": format!("{}/order/1/finalize", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_authorization(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/authz/1")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-127")
            .with_body(
                json!({
                    "identifier": {"type": "dns", "value": "example.com"},
                    "status": "pending",
                    "expires": "2026-02-10T00:00:00Z",
                    "challenges": [
                        {
                            "type": "http-01",
                            "url": format!("{}/chall/1", url),
                            "status": "pending",
                            "token": "test-token"
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_challenge_trigger(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/chall/1")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-128")
            .with_body(
                json!({
                    "type": "http-01",
                    "url": format!("{}/chall/1", url),
                    "status": "processing",
                    "token": "test-token"
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_order_ready(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/order/1")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-129")
            .with_body(
                json!({
                    "status": "ready",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/authz/1", url)],
                    "finalize": format!("{}/order/1/finalize", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    /// A still-processing order fetch carrying a `Retry-After: 30` header.
    pub async fn mock_order_processing_with_retry_after(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/order/1")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-129")
            .with_header("retry-after", "30")
            .with_body(
                json!({
                    "status": "processing",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/authz/1", url)],
                    "finalize": format!("{}/order/1/finalize", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    /// Registers two mocks on the account URL: a `badNonce` problem
    /// (consumed exactly once) layered over an always-succeeding fetch.
    /// Mockito matches the most-recently-created mock first, so the
    /// `badNonce` mock intercepts the first POST to this URL; once its
    /// single expected hit is spent, matching falls through to the
    /// success mock underneath for the retried request.
    pub async fn mock_account_fetch_bad_nonce_then_success(&mut self) -> (mockito::Mock, mockito::Mock) {
        let url = self.url();
        let success = self
            .server
            .mock("POST", "/account/1")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-201")
            .with_body(
                json!({
                    "status": "valid",
                    "contact": ["mailto:admin@example.com"],
                    "orders": format!("{}/account/1/orders", url)
                })
                .to_string(),
            )
            .create_async()
            .await;

        let bad_nonce = self
            .server
            .mock("POST", "/account/1")
            .with_status(400)
            .with_header("content-type", "application/problem+json")
            .with_header("replay-nonce", "test-nonce-200")
            .with_body(
                json!({
                    "type": "urn:ietf:params:acme:error:badNonce",
                    "detail": "JWS has an invalid anti-replay nonce"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        (success, bad_nonce)
    }

    pub async fn mock_orders_page(
        &mut self,
        path: &str,
        order_urls: &[String],
        next_link: Option<&str>,
    ) -> mockito::Mock {
        let mut mock = self
            .server
            .mock("POST", path)
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-131")
            .with_body(json!({ "orders": order_urls }).to_string());
        if let Some(next) = next_link {
            mock = mock.with_header("link", &format!(r#"<{next}>;rel="next""#));
        }
        mock.create_async().await
    }

    pub async fn mock_finalize(&mut self) -> mockito::Mock {
        let url = self.url();
        self.server
            .mock("POST", "/order/1/finalize")
            .with_status(200)
            .with_header("replay-nonce", "test-nonce-130")
            .with_body(
                json!({
                    "status": "valid",
                    "identifiers": [{"type": "dns", "value": "example.com"}],
                    "authorizations": [format!("{}/authz/1", url)],
                    "finalize": format!("{}/order/1/finalize", url),
                    "certificate": format!("{}/cert/1", url)
                })
                .to_string(),
            )
            .create_async()
            .await
    }
}
