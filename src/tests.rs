#[cfg(test)]
mod integration_tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn register_resident(server: &TestServer, username: &str) -> i64 {
        let response = server
            .post("/register/")
            .json(&json!({
                "username": username,
                "password": "kapitbahay",
                "first_name": username,
                "family_members": "4",
                "purok": "Purok 3",
                "address": "123 Mabini St"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    async fn login(server: &TestServer, username: &str, password: &str) -> (String, String) {
        let response = server
            .post("/login/")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        (
            body.data["access"].as_str().unwrap().to_string(),
            body.data["refresh"].as_str().unwrap().to_string(),
        )
    }

    async fn create_batch(server: &TestServer, access: &str, name: &str) -> i64 {
        let response = server
            .post("/relief-goods/")
            .authorization_bearer(access)
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_resident() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/register/")
            .json(&json!({
                "username": "juan",
                "password": "kapitbahay",
                "first_name": "Juan",
                "family_members": "4",
                "purok": "Purok 3",
                "address": "123 Mabini St"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["username"], "juan");
        assert!(body.data["id"].as_i64().unwrap() > 0);
        assert_eq!(body.data["profile"]["family_members"], "4");
        assert_eq!(body.data["profile"]["purok"], "Purok 3");
        // The password never comes back in any form
        assert!(body.data.get("password").is_none());
        assert!(body.data.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register_resident(&server, "juan").await;

        let response = server
            .post("/register/")
            .json(&json!({
                "username": "juan",
                "password": "ibangtao",
                "family_members": "2"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "USERNAME_ALREADY_EXISTS");

        // No second row was created
        let list = server.get("/residents/").await;
        let list_body: ApiResponse<Vec<Value>> = list.json();
        let juans = list_body
            .data
            .iter()
            .filter(|u| u["username"] == "juan")
            .count();
        assert_eq!(juans, 1);
    }

    #[tokio::test]
    async fn test_register_requires_family_members() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/register/")
            .json(&json!({
                "username": "juan",
                "password": "kapitbahay",
                "family_members": ""
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_returns_tokens_and_identity() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register_resident(&server, "juan").await;

        let response = server
            .post("/login/")
            .json(&json!({ "username": "juan", "password": "kapitbahay" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert!(body.data["access"].as_str().unwrap().len() > 0);
        assert!(body.data["refresh"].as_str().unwrap().len() > 0);
        assert_eq!(body.data["username"], "juan");
        assert_eq!(body.data["is_staff"], false);
        assert_eq!(body.data["is_superuser"], false);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials_uniformly() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register_resident(&server, "juan").await;

        // Wrong password and unknown username are indistinguishable
        let wrong_password = server
            .post("/login/")
            .json(&json!({ "username": "juan", "password": "mali" }))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        let wrong_password_body: Value = wrong_password.json();

        let unknown_user = server
            .post("/login/")
            .json(&json!({ "username": "walang-tao", "password": "mali" }))
            .await;
        unknown_user.assert_status(StatusCode::UNAUTHORIZED);
        let unknown_user_body: Value = unknown_user.json();

        assert_eq!(wrong_password_body, unknown_user_body);
    }

    #[tokio::test]
    async fn test_token_refresh_flow() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (_, refresh) = login(&server, "admin", "adminpass").await;

        let response = server
            .post("/token/refresh/")
            .json(&json!({ "refresh": refresh }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let new_access = body.data["access"].as_str().unwrap();

        // The refreshed access token still carries the staff role
        let created = server
            .post("/relief-goods/")
            .authorization_bearer(new_access)
            .json(&json!({ "name": "Rice Packs" }))
            .await;
        created.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (access, _) = login(&server, "admin", "adminpass").await;

        let response = server
            .post("/token/refresh/")
            .json(&json!({ "refresh": access }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_generate_qr_is_idempotent() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;

        let first = server.post(&format!("/generate-qr/{}/", user_id)).await;
        first.assert_status(StatusCode::CREATED);
        let first_body: ApiResponse<Value> = first.json();
        let first_url = first_body.data["qr"].as_str().unwrap().to_string();
        assert!(first_url.ends_with(&format!("qrCodes/user_{}_qr.png", user_id)));

        let second = server.post(&format!("/generate-qr/{}/", user_id)).await;
        second.assert_status(StatusCode::OK);
        let second_body: ApiResponse<Value> = second.json();
        assert_eq!(second_body.data["qr"].as_str().unwrap(), first_url);
        assert_eq!(second_body.data["id"], first_body.data["id"]);
    }

    #[tokio::test]
    async fn test_generate_qr_unknown_user() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.post("/generate-qr/9999/").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_check_qr_never_creates() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;

        let before = server.get(&format!("/check-qr/{}/", user_id)).await;
        before.assert_status(StatusCode::OK);
        let before_body: ApiResponse<Value> = before.json();
        assert_eq!(before_body.data["has_qr"], false);
        assert_eq!(before_body.data["qr"], Value::Null);

        // Checking again still reports absent; the check is read-only
        let again = server.get(&format!("/check-qr/{}/", user_id)).await;
        let again_body: ApiResponse<Value> = again.json();
        assert_eq!(again_body.data["has_qr"], false);

        server
            .post(&format!("/generate-qr/{}/", user_id))
            .await
            .assert_status(StatusCode::CREATED);

        let after = server.get(&format!("/check-qr/{}/", user_id)).await;
        let after_body: ApiResponse<Value> = after.json();
        assert_eq!(after_body.data["has_qr"], true);
        assert!(after_body.data["qr"].as_str().unwrap().contains("qrCodes/"));
    }

    #[tokio::test]
    async fn test_qr_image_is_served_under_media() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;
        server
            .post(&format!("/generate-qr/{}/", user_id))
            .await
            .assert_status(StatusCode::CREATED);

        let image = server
            .get(&format!("/media/qrCodes/user_{}_qr.png", user_id))
            .await;
        image.assert_status(StatusCode::OK);
        let bytes = image.as_bytes();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_relief_goods_crud() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (access, _) = login(&server, "admin", "adminpass").await;

        let first_id = create_batch(&server, &access, "Rice Packs").await;
        let second_id = create_batch(&server, &access, "Canned Goods").await;

        // Most recently issued first
        let list = server.get("/relief-goods/").await;
        list.assert_status(StatusCode::OK);
        let list_body: ApiResponse<Vec<Value>> = list.json();
        assert_eq!(list_body.data.len(), 2);
        let dates: Vec<&str> = list_body
            .data
            .iter()
            .map(|batch| batch["date_issued"].as_str().unwrap())
            .collect();
        assert!(dates[0] >= dates[1]);

        let detail = server.get(&format!("/relief-goods/{}/", first_id)).await;
        detail.assert_status(StatusCode::OK);
        let detail_body: ApiResponse<Value> = detail.json();
        assert_eq!(detail_body.data["name"], "Rice Packs");
        assert_eq!(detail_body.data["claimed_by"].as_array().unwrap().len(), 0);

        let deleted = server
            .delete(&format!("/relief-goods/{}/delete/", second_id))
            .authorization_bearer(&access)
            .await;
        deleted.assert_status(StatusCode::NO_CONTENT);

        let gone = server.get(&format!("/relief-goods/{}/", second_id)).await;
        gone.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_relief_goods_admin_endpoints_require_staff() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // No token at all
        let anonymous = server
            .post("/relief-goods/")
            .json(&json!({ "name": "Rice Packs" }))
            .await;
        anonymous.assert_status(StatusCode::UNAUTHORIZED);

        // A plain resident's token is not enough
        register_resident(&server, "juan").await;
        let (resident_access, _) = login(&server, "juan", "kapitbahay").await;
        let forbidden = server
            .post("/relief-goods/")
            .authorization_bearer(&resident_access)
            .json(&json!({ "name": "Rice Packs" }))
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);

        let delete_forbidden = server
            .delete("/relief-goods/1/delete/")
            .authorization_bearer(&resident_access)
            .await;
        delete_forbidden.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_claim_flow_and_exclusivity() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;
        let (access, _) = login(&server, "admin", "adminpass").await;
        let batch_id = create_batch(&server, &access, "Rice Packs").await;

        let claimed = server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({ "user_id": user_id }))
            .await;
        claimed.assert_status(StatusCode::OK);
        let claimed_body: ApiResponse<Value> = claimed.json();
        let claimers = claimed_body.data["claimed_by"].as_array().unwrap();
        assert_eq!(claimers.len(), 1);
        assert_eq!(claimers[0]["username"], "juan");

        // A second claim by the same resident is rejected, not ignored
        let duplicate = server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({ "user_id": user_id }))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);
        let duplicate_body: Value = duplicate.json();
        assert_eq!(duplicate_body["code"], "ALREADY_CLAIMED");

        // The claim set is unchanged in size
        let detail = server.get(&format!("/relief-goods/{}/", batch_id)).await;
        let detail_body: ApiResponse<Value> = detail.json();
        assert_eq!(detail_body.data["claimed_by"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_validation_and_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;
        let (access, _) = login(&server, "admin", "adminpass").await;
        let batch_id = create_batch(&server, &access, "Rice Packs").await;

        let missing_user_id = server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({}))
            .await;
        missing_user_id.assert_status(StatusCode::BAD_REQUEST);
        let missing_body: Value = missing_user_id.json();
        assert_eq!(missing_body["code"], "USER_ID_REQUIRED");

        let unknown_batch = server
            .post("/reliefgoods/9999/claim/")
            .json(&json!({ "user_id": user_id }))
            .await;
        unknown_batch.assert_status(StatusCode::NOT_FOUND);

        let unknown_user = server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({ "user_id": 9999 }))
            .await;
        unknown_user.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register_resident(&server, "juan").await;
        register_resident(&server, "maria").await;

        // Residents: no staff, no superusers
        let residents = server.get("/residents/").await;
        residents.assert_status(StatusCode::OK);
        let residents_body: ApiResponse<Vec<Value>> = residents.json();
        assert_eq!(residents_body.data.len(), 2);
        assert!(residents_body
            .data
            .iter()
            .all(|u| u["username"] != "admin" && u["username"] != "root"));
        // Profiles are nested
        assert!(residents_body
            .data
            .iter()
            .all(|u| u["profile"]["family_members"] == "4"));

        // Users: staff included, superusers never
        let users = server.get("/users/").await;
        users.assert_status(StatusCode::OK);
        let users_body: ApiResponse<Vec<Value>> = users.json();
        assert!(users_body.data.iter().any(|u| u["username"] == "admin"));
        assert!(users_body.data.iter().all(|u| u["username"] != "root"));
        // The staff account has no profile row; the field is null
        let admin = users_body
            .data
            .iter()
            .find(|u| u["username"] == "admin")
            .unwrap();
        assert_eq!(admin["profile"], Value::Null);
    }

    #[tokio::test]
    async fn test_profile_detail_projection() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;
        server
            .post(&format!("/generate-qr/{}/", user_id))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get(&format!("/profile/{}/", user_id)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["username"], "juan");
        assert_eq!(body.data["profile"]["purok"], "Purok 3");
        assert!(body.data["qr"].as_str().unwrap().contains("qrCodes/"));

        let missing = server.get("/profile/9999/").await;
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_profile_picture() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;

        // Any valid PNG payload will do; content is not inspected
        let form = MultipartForm::new().add_part(
            "profile_picture",
            Part::bytes(b"fake-png-bytes".to_vec())
                .file_name("me.png")
                .mime_type("image/png"),
        );
        let response = server
            .put(&format!("/profile/{}/upload-picture/", user_id))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let url = body.data["profile_picture"].as_str().unwrap();
        assert!(url.contains("profile_pictures/"));
        assert!(url.ends_with("me.png"));

        // Unsupported extension is a validation error
        let bad_form = MultipartForm::new().add_part(
            "profile_picture",
            Part::bytes(b"gif-bytes".to_vec())
                .file_name("me.gif")
                .mime_type("image/gif"),
        );
        let rejected = server
            .put(&format!("/profile/{}/upload-picture/", user_id))
            .multipart(bad_form)
            .await;
        rejected.assert_status(StatusCode::BAD_REQUEST);
        let rejected_body: Value = rejected.json();
        assert_eq!(rejected_body["code"], "UNSUPPORTED_FILE_EXTENSION");

        // No profile row, no update target
        let no_profile_form = MultipartForm::new().add_part(
            "profile_picture",
            Part::bytes(b"png-bytes".to_vec())
                .file_name("me.png")
                .mime_type("image/png"),
        );
        let missing = server
            .put("/profile/9999/upload-picture/")
            .multipart(no_profile_form)
            .await;
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_picture_strips_path_traversal_names() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "maria").await;

        // A traversal name must collapse to its bare file name and
        // land inside the profile_pictures namespace
        let form = MultipartForm::new().add_part(
            "profile_picture",
            Part::bytes(b"png-bytes".to_vec())
                .file_name("../../../../escape.png")
                .mime_type("image/png"),
        );
        let response = server
            .put(&format!("/profile/{}/upload-picture/", user_id))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let url = body.data["profile_picture"].as_str().unwrap();
        assert!(url.ends_with(&format!(
            "/media/profile_pictures/user_{}_escape.png",
            user_id
        )));

        // The stored blob is served from inside the media root
        let served = server
            .get(&format!("/media/profile_pictures/user_{}_escape.png", user_id))
            .await;
        served.assert_status(StatusCode::OK);

        // A name that cannot be reduced to a bare file name is rejected
        let bad_form = MultipartForm::new().add_part(
            "profile_picture",
            Part::bytes(b"png-bytes".to_vec())
                .file_name("..\\escape.png")
                .mime_type("image/png"),
        );
        let rejected = server
            .put(&format!("/profile/{}/upload-picture/", user_id))
            .multipart(bad_form)
            .await;
        rejected.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_id = register_resident(&server, "juan").await;
        server
            .post(&format!("/generate-qr/{}/", user_id))
            .await
            .assert_status(StatusCode::CREATED);

        let (access, _) = login(&server, "admin", "adminpass").await;
        let batch_id = create_batch(&server, &access, "Rice Packs").await;
        server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({ "user_id": user_id }))
            .await
            .assert_status(StatusCode::OK);

        // Anonymous deletion is rejected
        let anonymous = server.delete(&format!("/users/delete/{}/", user_id)).await;
        anonymous.assert_status(StatusCode::UNAUTHORIZED);

        let deleted = server
            .delete(&format!("/users/delete/{}/", user_id))
            .authorization_bearer(&access)
            .await;
        deleted.assert_status(StatusCode::NO_CONTENT);

        // Profile and QR record are gone with the user
        server
            .get(&format!("/profile/{}/", user_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/check-qr/{}/", user_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // And the claim association was discarded
        let detail = server.get(&format!("/relief-goods/{}/", batch_id)).await;
        let detail_body: ApiResponse<Value> = detail.json();
        assert_eq!(detail_body.data["claimed_by"].as_array().unwrap().len(), 0);

        // Deleting again is a 404
        let again = server
            .delete(&format!("/users/delete/{}/", user_id))
            .authorization_bearer(&access)
            .await;
        again.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_end_to_end_distribution_scenario() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Register juan with family_members = "4"
        let juan_id = register_resident(&server, "juan").await;

        // Issue juan's QR
        server
            .post(&format!("/generate-qr/{}/", juan_id))
            .await
            .assert_status(StatusCode::CREATED);

        // Create the batch and let juan claim it
        let (access, _) = login(&server, "admin", "adminpass").await;
        let batch_id = create_batch(&server, &access, "Rice Packs").await;

        let claimed = server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({ "user_id": juan_id }))
            .await;
        claimed.assert_status(StatusCode::OK);
        let claimed_body: ApiResponse<Value> = claimed.json();
        let claimers = claimed_body.data["claimed_by"].as_array().unwrap();
        assert_eq!(claimers.len(), 1);
        assert_eq!(claimers[0]["username"], "juan");

        // A second claim is rejected
        let duplicate = server
            .post(&format!("/reliefgoods/{}/claim/", batch_id))
            .json(&json!({ "user_id": juan_id }))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);

        // Delete the batch; it is gone along with its claims
        server
            .delete(&format!("/relief-goods/{}/delete/", batch_id))
            .authorization_bearer(&access)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/relief-goods/{}/", batch_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
