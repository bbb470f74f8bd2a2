use crud_api::{CrudService, HttpApiConfig, HttpApiError, HttpClient};

fn service() -> CrudService {
    let client = HttpClient::new(HttpApiConfig::new()).expect("client");
    CrudService::new("http://host/api/articles/", client)
}

#[test]
fn controller_url_is_normalized() {
    assert_eq!(service().controller(), "http://host/api/articles");
}

#[test]
fn item_url_joins_the_id() {
    assert_eq!(service().item_url("42"), "http://host/api/articles/42");
}

#[test]
fn many_url_joins_ids_with_commas() {
    assert_eq!(
        service().many_url(&["1", "2", "3"]),
        "http://host/api/articles/many/1,2,3"
    );
}

#[tokio::test]
async fn get_with_an_empty_id_fails_fast() {
    let error = service().get("", None).await.unwrap_err();
    assert!(matches!(error, HttpApiError::MissingId));
}

#[tokio::test]
async fn delete_with_an_empty_id_fails_fast() {
    let error = service().delete("").await.unwrap_err();
    assert!(matches!(error, HttpApiError::MissingId));
}
