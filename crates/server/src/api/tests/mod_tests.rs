use super::*;
use async_trait::async_trait;
use shared::domain::ProductInfo;

use crate::product_info::MissingProductCatalog;

struct FixedCatalog;

#[async_trait]
impl ProductCatalog for FixedCatalog {
    async fn lookup(&self, asin: &str) -> anyhow::Result<ProductInfo> {
        Ok(ProductInfo {
            name: format!("Product {asin}"),
            image: "https://img.example/p.jpg".into(),
            rating: Some(4.0),
            price: None,
        })
    }
}

async fn setup(catalog: Arc<dyn ProductCatalog>) -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext {
        storage,
        catalog,
        password_hash_cost: 4,
    }
}

fn signup(email: &str) -> CreateUserRequest {
    CreateUserRequest {
        first_name: "Jo".into(),
        last_name: "Li".into(),
        email: email.into(),
        password: "Abcdef1!".into(),
    }
}

#[tokio::test]
async fn create_user_requires_every_field() {
    let ctx = setup(Arc::new(MissingProductCatalog)).await;
    let mut req = signup("jo@test.com");
    req.last_name = "   ".into();

    let err = create_user(&ctx, req).await.expect_err("missing field");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "All fields are required");
}

#[tokio::test]
async fn create_user_hashes_password_and_rejects_duplicates() {
    let ctx = setup(Arc::new(MissingProductCatalog)).await;

    let user = create_user(&ctx, signup("jo@test.com"))
        .await
        .expect("create");
    assert_eq!(user.email, "jo@test.com");
    assert!(check_user(&ctx, "jo@test.com").await.expect("check"));

    let stored = ctx
        .storage
        .find_user_by_email("jo@test.com")
        .await
        .expect("lookup")
        .expect("stored");
    assert_ne!(stored.password_hash, "Abcdef1!");
    assert!(bcrypt::verify("Abcdef1!", &stored.password_hash).expect("verify"));

    let err = create_user(&ctx, signup("JO@test.com"))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(err.message, EMAIL_IN_USE);
}

#[tokio::test]
async fn sign_in_checks_password() {
    let ctx = setup(Arc::new(MissingProductCatalog)).await;
    create_user(&ctx, signup("jo@test.com"))
        .await
        .expect("create");

    let user = sign_in(
        &ctx,
        SignInRequest {
            email: "jo@test.com".into(),
            password: "Abcdef1!".into(),
        },
    )
    .await
    .expect("sign in");
    assert_eq!(user.first_name, "Jo");

    for (email, password) in [
        ("jo@test.com", "wrong-pass"),
        ("nobody@test.com", "Abcdef1!"),
        ("", ""),
    ] {
        let err = sign_in(
            &ctx,
            SignInRequest {
                email: email.into(),
                password: password.into(),
            },
        )
        .await
        .expect_err("rejected");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, INVALID_CREDENTIALS);
    }
}

#[tokio::test]
async fn records_require_name_and_description() {
    let ctx = setup(Arc::new(MissingProductCatalog)).await;

    let err = insert_record(
        &ctx,
        InsertRecordRequest {
            name: "lamp".into(),
            description: String::new(),
        },
    )
    .await
    .expect_err("missing description");
    assert_eq!(err.message, "Missing required fields");

    insert_record(
        &ctx,
        InsertRecordRequest {
            name: "lamp".into(),
            description: "desk lamp".into(),
        },
    )
    .await
    .expect("insert");
    let records = list_records(&ctx).await.expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "lamp");
}

#[tokio::test]
async fn record_insert_fault_reports_insert_failure() {
    let ctx = setup(Arc::new(MissingProductCatalog)).await;
    ctx.storage.close().await;

    let err = insert_record(
        &ctx,
        InsertRecordRequest {
            name: "lamp".into(),
            description: "desk lamp".into(),
        },
    )
    .await
    .expect_err("closed pool");
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(err.message, INSERT_FAILED);
}

#[tokio::test]
async fn product_info_validates_link_before_lookup() {
    let ctx = setup(Arc::new(FixedCatalog)).await;

    let err = product_info(&ctx, "  ").await.expect_err("empty");
    assert_eq!(err.message, "Product link is required");

    let err = product_info(&ctx, "https://www.amazon.com/")
        .await
        .expect_err("no asin");
    assert_eq!(err.message, "Invalid Amazon link");

    let product = product_info(&ctx, "https://www.amazon.com/dp/B000000001")
        .await
        .expect("lookup");
    assert_eq!(product.name, "Product B000000001");
}

#[tokio::test]
async fn product_info_upstream_failure_is_generic() {
    let ctx = setup(Arc::new(MissingProductCatalog)).await;
    let err = product_info(&ctx, "https://www.amazon.com/dp/B000000001")
        .await
        .expect_err("unconfigured");
    assert_eq!(err.code, ErrorCode::Upstream);
    assert_eq!(err.message, "Failed to fetch product data");
}
