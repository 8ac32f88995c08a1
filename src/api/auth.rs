use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            auth::{AuthToken, VoterRole, AUTH_TOKEN_COOKIE},
            credentials::{normalize_email, LoginRequest, Registration},
            user::SafeUser,
        },
        db::voter::{NewVoter, Voter},
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![register, login, me, logout]
}

#[post("/auth/register", data = "<registration>", format = "json")]
pub async fn register(
    registration: Json<Registration>,
    cookies: &CookieJar<'_>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
    config: &State<Config>,
) -> Result<(Status, Json<SafeUser>)> {
    let voter = NewVoter::try_from(registration.into_inner())?;

    if voters
        .find_one(doc! { "email": &voter.email }, None)
        .await?
        .is_some()
    {
        return Err(Error::bad_request("Email already in use"));
    }
    if voters
        .find_one(doc! { "voter_id": &voter.voter_id }, None)
        .await?
        .is_some()
    {
        return Err(Error::bad_request("Voter ID already registered"));
    }

    // A concurrent registration can still slip past the checks above; the unique indexes
    // catch it.
    let new_id: Id = match new_voters.insert_one(&voter, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::Status(Status::InternalServerError, "Bad voter ID".to_string()))?
            .into(),
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::bad_request("User already exists"));
        }
        Err(err) => return Err(err.into()),
    };
    let voter = voters
        .find_one(new_id.as_doc(), None)
        .await?
        .ok_or(Error::VoterNotFound(new_id))?;

    let token = AuthToken::<VoterRole>::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok((Status::Created, Json(voter.into())))
}

#[post("/auth/login", data = "<credentials>", format = "json")]
pub async fn login(
    credentials: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    voters: Coll<Voter>,
    config: &State<Config>,
) -> Result<Json<SafeUser>> {
    let with_email = doc! {
        "email": normalize_email(&credentials.email),
    };

    let voter = voters
        .find_one(with_email, None)
        .await?
        .filter(|voter| voter.verify_password(&credentials.password))
        .ok_or_else(|| Error::Status(Status::Unauthorized, "Invalid credentials".to_string()))?;

    let token = AuthToken::<VoterRole>::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok(Json(voter.into()))
}

#[get("/auth/me")]
pub async fn me(token: AuthToken<VoterRole>, voters: Coll<Voter>) -> Result<Json<SafeUser>> {
    let voter = voters
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or(Error::VoterNotFound(token.id))?;
    Ok(Json(voter.into()))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client, serde::json::serde_json::json};

    use crate::error::ErrorBody;
    use crate::model::db::voter::EXAMPLE_PASSWORD;

    use super::*;

    #[backend_test]
    async fn register_signs_in(client: Client, voters: Coll<Voter>) {
        let response = client
            .post(uri!("/api", register()))
            .header(ContentType::JSON)
            .body(json!(Registration::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Created, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
        let body = response.into_string().await.unwrap();
        assert!(!body.contains("password"));

        let user: SafeUser = rocket::serde::json::serde_json::from_str(&body).unwrap();
        assert_eq!(user.email, "asha.patil@example.com");
        assert!(!user.is_admin);
        assert!(!user.has_voted);

        let stored = voters
            .find_one(doc! { "email": &user.email }, None)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, Registration::example().password);
        assert!(stored.verify_password(Registration::example().password));
    }

    #[backend_test]
    async fn register_rejects_duplicates(client: Client, voters: Coll<NewVoter>) {
        voters.insert_one(NewVoter::example(), None).await.unwrap();

        let mut same_email = Registration::example();
        same_email.email = NewVoter::example().email.to_uppercase();
        let response = client
            .post(uri!("/api", register()))
            .header(ContentType::JSON)
            .body(json!(same_email).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.message, "Email already in use");

        let mut same_voter_id = Registration::example();
        same_voter_id.voter_id = NewVoter::example().voter_id;
        let response = client
            .post(uri!("/api", register()))
            .header(ContentType::JSON)
            .body(json!(same_voter_id).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body = response.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.message, "Voter ID already registered");

        assert_eq!(voters.count_documents(doc! { "is_admin": false }, None).await.unwrap(), 1);
    }

    #[backend_test]
    async fn register_validates(client: Client) {
        let mut short_password = Registration::example();
        short_password.password = "12345".to_string();
        let response = client
            .post(uri!("/api", register()))
            .header(ContentType::JSON)
            .body(json!(short_password).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test]
    async fn login_valid(client: Client, voters: Coll<NewVoter>) {
        voters.insert_one(NewVoter::example(), None).await.unwrap();

        let response = client
            .post(uri!("/api", login()))
            .header(ContentType::JSON)
            .body(json!(LoginRequest::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
        let user = response.into_json::<SafeUser>().await.unwrap();
        assert_eq!(user.voter_id, NewVoter::example().voter_id);
    }

    #[backend_test]
    async fn login_invalid(client: Client, voters: Coll<NewVoter>) {
        voters.insert_one(NewVoter::example(), None).await.unwrap();

        for (email, password) in [
            (NewVoter::example().email, "wrong password".to_string()),
            ("nobody@example.com".to_string(), EXAMPLE_PASSWORD.to_string()),
        ] {
            let response = client
                .post(uri!("/api", login()))
                .header(ContentType::JSON)
                .body(json!({ "email": email, "password": password }).to_string())
                .dispatch()
                .await;

            assert_eq!(Status::Unauthorized, response.status());
            let body = response.into_json::<ErrorBody>().await.unwrap();
            assert_eq!(body.message, "Invalid credentials");
        }
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }

    #[backend_test(voter)]
    async fn me_reflects_voting_status(client: Client, voters: Coll<Voter>) {
        let response = client.get(uri!("/api", me())).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let user = response.into_json::<SafeUser>().await.unwrap();
        assert!(!user.has_voted);

        voters
            .update_one(
                doc! { "email": &user.email },
                doc! { "$set": { "has_voted": true } },
                None,
            )
            .await
            .unwrap();
        let user = client
            .get(uri!("/api", me()))
            .dispatch()
            .await
            .into_json::<SafeUser>()
            .await
            .unwrap();
        assert!(user.has_voted);
    }

    #[backend_test]
    async fn me_requires_sign_in(client: Client) {
        let response = client.get(uri!("/api", me())).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
        assert!(response.into_json::<ErrorBody>().await.is_some());
    }

    #[backend_test(voter)]
    async fn logout_removes_cookie(client: Client) {
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let response = client.delete(uri!("/api", logout())).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_none());
    }
}
