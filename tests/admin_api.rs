//! Product editor and team member endpoints against a mock platform API

mod common;

use assert_matches::assert_matches;
use common::*;
use pretty_assertions::assert_eq;
use rehab_portal::client::{
    ApiError, ImageUpload, ProductForm, ProductType, TeamMemberForm,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, ResponseTemplate};

fn photo(name: &str) -> ImageUpload {
    ImageUpload::new(name, "image/png", b"PNG".to_vec())
}

#[tokio::test]
async fn test_edit_product_round_trip() {
    let client = TestClient::start().await;
    Mock::given(method("GET"))
        .and(path("/products/12"))
        .and(header("Authorization", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "Walker",
            "productType": "RENT",
            "category": { "id": 3, "name": "Mobility" },
            "stock": { "S": 10, "L": 5 },
            "buyPrice": { "S": 99.5, "L": 120 },
            "weightInKg": [4, 4.5],
            "description": "Foldable"
        })))
        .expect(1)
        .mount(&client.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "name": "Mobility" },
            { "id": 4, "name": "Beds" }
        ])))
        .expect(1)
        .mount(&client.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/products/12"))
        .and(header("Authorization", "abc"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("Walker Pro"))
        .and(body_string_contains("[12,5]"))
        .and(body_string_contains("[99.5,120]"))
        .and(body_string_contains("[4,4.5]"))
        .and(body_string_contains(r#"name="images"; filename="front.png""#))
        .and(body_string_contains(r#"name="images"; filename="side.png""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_body("Saved")))
        .expect(1)
        .mount(&client.server)
        .await;

    let api = client.manager.api();
    let product = api.fetch_product("12", Some("abc")).await.unwrap();
    let categories = api.fetch_categories(Some("abc")).await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(product.product_type, Some(ProductType::Rent));

    let mut form = ProductForm::from_product(&product);
    assert_eq!(form.category_id, categories[0].id);
    form.name = "Walker Pro".to_string();
    form.stock = "12,5".to_string();

    let update = form
        .validate(vec![photo("front.png"), photo("side.png")])
        .unwrap();
    let response = api.update_product("12", &update, Some("abc")).await.unwrap();
    assert_eq!(response.message.as_deref(), Some("Saved"));
}

#[tokio::test]
async fn test_update_product_rejected() {
    let client = TestClient::start().await;
    Mock::given(method("PUT"))
        .and(path("/products/9"))
        .respond_with(ResponseTemplate::new(403).set_body_json(message_body("Admins only")))
        .mount(&client.server)
        .await;

    let form = ProductForm {
        name: "Bed".to_string(),
        product_type: "buy".to_string(),
        category_id: "4".to_string(),
        stock: "1".to_string(),
        price: "500".to_string(),
        weight: "40".to_string(),
        description: "Adjustable".to_string(),
    };
    let update = form.validate(vec![photo("a.png"), photo("b.png")]).unwrap();

    let err = client
        .manager
        .api()
        .update_product("9", &update, None)
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Server { .. });
    assert_eq!(err.server_message(), Some("Admins only"));
}

#[tokio::test]
async fn test_add_team_member() {
    let client = TestClient::start().await;
    Mock::given(method("GET"))
        .and(path("/location/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 1, "name": "Downtown" }, { "id": 2, "name": "Harbor" }]
        })))
        .expect(1)
        .mount(&client.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/team-member/create"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("Dr. Lee"))
        .and(body_string_contains(r#"name="file"; filename="lee.png""#))
        .and(body_string_contains(r#"name="locationId""#))
        .and(body_string_contains("Sports injuries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&client.server)
        .await;

    let api = client.manager.api();
    let locations = api.fetch_locations(Some("abc")).await.unwrap();
    assert_eq!(locations[1].name, "Harbor");

    let member = TeamMemberForm {
        name: "Dr. Lee".to_string(),
        position: "Physiotherapist".to_string(),
        location_id: locations[1].id.clone(),
        specialty: "Sports injuries".to_string(),
        picture: Some(photo("lee.png")),
    }
    .validate()
    .unwrap();

    let response = api.create_team_member(&member, Some("abc")).await.unwrap();
    assert!(response.message.is_none());
}

#[tokio::test]
async fn test_product_id_is_escaped() {
    let client = TestClient::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1%3Fadmin=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&client.server)
        .await;

    let product = client
        .manager
        .api()
        .fetch_product("1?admin=true", None)
        .await
        .unwrap();
    assert_eq!(product.id, "1");
}
