mod common;

use acme_core::prelude::*;
use common::MockAcmeServer;

#[tokio::test]
async fn registers_account_and_updates_contacts() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let session = Session::connect(
        format!("{}/directory", mock_server.url()),
        ClientSettings::default(),
    )
    .await?;
    let key_pair = KeyPair::generate(KeyType::EcdsaP256)?;

    let (account, login) = AccountBuilder::new()
        .contact(Contact::email("admin@example.com"))
        .agree_to_terms_of_service()
        .create(&session, key_pair)
        .await?;

    assert_eq!(account.status(), AccountStatus::Valid);
    assert_eq!(login.kid(), format!("{}/account/1", mock_server.url()).as_str());
    assert_eq!(account.contact(), &["mailto:admin@example.com".to_string()]);

    let _m_update = mock_server.mock_account_update(&["mailto:ops@example.com"]).await;
    let mut account = account;
    account.modify(&login, &[Contact::email("ops@example.com")]).await?;
    assert_eq!(account.contact(), &["mailto:ops@example.com".to_string()]);

    Ok(())
}

#[tokio::test]
async fn rolling_over_to_the_same_key_fails_locally_without_a_network_call() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let session = Session::connect(
        format!("{}/directory", mock_server.url()),
        ClientSettings::default(),
    )
    .await?;
    let key_pair = KeyPair::generate(KeyType::EcdsaP256)?;

    let (_account, login) = AccountBuilder::new()
        .contact(Contact::email("admin@example.com"))
        .agree_to_terms_of_service()
        .create(&session, key_pair.clone())
        .await?;

    // No `keyChange` mock is registered: if the same-key check didn't short
    // circuit before the network call, this would fail on an unmatched mock
    // rather than the expected protocol error.
    let err = acme_core::account::change_key(&login, key_pair).await.unwrap_err();
    assert!(matches!(err, AcmeError::Protocol { .. }));

    Ok(())
}

#[tokio::test]
async fn orders_list_paginates_through_the_object_wrapped_orders_array() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let base = mock_server.url();
    let _m_page1 = mock_server
        .mock_orders_page(
            "/account/1/orders",
            &[format!("{base}/order/1"), format!("{base}/order/2")],
            Some(&format!("{base}/account/1/orders-page2")),
        )
        .await;
    let _m_page2 = mock_server
        .mock_orders_page("/account/1/orders-page2", &[format!("{base}/order/3")], None)
        .await;

    let session = Session::connect(
        format!("{}/directory", mock_server.url()),
        ClientSettings::default(),
    )
    .await?;
    let key_pair = KeyPair::generate(KeyType::EcdsaP256)?;

    let (account, login) = AccountBuilder::new()
        .contact(Contact::email("admin@example.com"))
        .agree_to_terms_of_service()
        .create(&session, key_pair)
        .await?;

    let mut orders = account.orders().expect("account advertises an orders URL");

    let page1 = orders.next_page(&login).await?.expect("first page");
    assert_eq!(page1, vec![format!("{base}/order/1"), format!("{base}/order/2")]);

    let page2 = orders.next_page(&login).await?.expect("second page");
    assert_eq!(page2, vec![format!("{base}/order/3")]);

    assert!(orders.next_page(&login).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn a_bad_nonce_is_retried_exactly_once_and_the_retry_succeeds() -> Result<()> {
    let mut mock_server = MockAcmeServer::new().await;
    let _m_dir = mock_server.mock_directory().await;
    let _m_nonce = mock_server.mock_new_nonce().await;
    let _m_account = mock_server.mock_new_account().await;

    let session = Session::connect(
        format!("{}/directory", mock_server.url()),
        ClientSettings::default(),
    )
    .await?;
    let key_pair = KeyPair::generate(KeyType::EcdsaP256)?;

    let (_account, login) = AccountBuilder::new()
        .contact(Contact::email("admin@example.com"))
        .agree_to_terms_of_service()
        .create(&session, key_pair)
        .await?;

    let (_m_success, m_bad_nonce) = mock_server.mock_account_fetch_bad_nonce_then_success().await;

    // The first attempt hits the badNonce mock; Connection::execute_signed
    // must transparently retry with the fresh nonce from its Replay-Nonce
    // header and return the successful fetch, with no error surfaced.
    let account = acme_core::Account::fetch(&login).await?;
    assert_eq!(account.status(), AccountStatus::Valid);

    m_bad_nonce.assert_async().await;

    Ok(())
}
