#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;

#[actix_rt::test]
async fn root_redirects_to_the_twit_list() {
    common::setup("twits-test").await;
    let app = test_app!();

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location_header(&resp), "/twits/");
}

#[actix_rt::test]
async fn twit_list_requires_login() {
    common::setup("twits-test").await;
    let app = test_app!();

    let req = test::TestRequest::get().uri("/twits/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location_header(&resp), "/accounts/login/");
}

#[actix_rt::test]
async fn a_created_twit_is_visible_in_the_list() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "lister", "testpass123");
    let cookie = login!(&app, "lister", "testpass123");

    let form = vec![
        ("body".to_owned(), "Nice twit content".to_owned()),
        (
            "image_url".to_owned(),
            "https://example.com/example.png".to_owned(),
        ),
    ];
    let req = test::TestRequest::post()
        .uri("/twits/new/")
        .cookie(cookie.clone())
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location_header(&resp), "/twits/");

    let req = test::TestRequest::get()
        .uri("/twits/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = common::read_body_string(resp).await;
    assert!(body.contains("Nice twit content"));
    assert!(body.contains("lister"));
    assert!(body.contains("https://example.com/example.png"));
    assert!(body.contains(r#"<span class="like_count">0</span>"#));
}

#[actix_rt::test]
async fn the_list_is_ordered_newest_first() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "chronological", "testpass123");
    let cookie = login!(&app, "chronological", "testpass123");

    post_twit!(&app, cookie, "Older twit marker-aaa");
    post_twit!(&app, cookie, "Newer twit marker-bbb");

    let req = test::TestRequest::get()
        .uri("/twits/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = common::read_body_string(resp).await;

    let newer = body
        .find("Newer twit marker-bbb")
        .expect("newer twit missing");
    let older = body
        .find("Older twit marker-aaa")
        .expect("older twit missing");
    assert!(newer < older, "newest twit should render first");
}

#[actix_rt::test]
async fn a_blank_twit_re_renders_the_form() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "blankposter", "testpass123");
    let cookie = login!(&app, "blankposter", "testpass123");

    let form = vec![
        ("body".to_owned(), "   ".to_owned()),
        ("image_url".to_owned(), String::new()),
    ];
    let req = test::TestRequest::post()
        .uri("/twits/new/")
        .cookie(cookie)
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "form should re-render");

    let body = common::read_body_string(resp).await;
    assert!(body.contains("needs some text"));
}

#[actix_rt::test]
async fn a_malformed_image_url_re_renders_the_form() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "badimage", "testpass123");
    let cookie = login!(&app, "badimage", "testpass123");

    let form = vec![
        ("body".to_owned(), "Twit with a broken image zzz".to_owned()),
        ("image_url".to_owned(), "not a url".to_owned()),
    ];
    let req = test::TestRequest::post()
        .uri("/twits/new/")
        .cookie(cookie)
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "form should re-render");

    let body = common::read_body_string(resp).await;
    assert!(body.contains("valid URL"));
    assert_eq!(
        common::twit_count_by_body("Twit with a broken image zzz").await,
        0
    );
}

#[actix_rt::test]
async fn the_owner_can_edit_their_twit() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "editor", "testpass123");
    let cookie = login!(&app, "editor", "testpass123");
    let twit_id = post_twit!(&app, cookie, "Editable twit marker-ccc");

    let form = vec![
        ("body".to_owned(), "Updated text marker-ccc".to_owned()),
        (
            "image_url".to_owned(),
            "https://example.com/example3.png".to_owned(),
        ),
    ];
    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/edit/", twit_id))
        .cookie(cookie)
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location_header(&resp), "/twits/");

    let twit = common::twit_by_id(twit_id).await.expect("twit vanished");
    assert_eq!(twit.body, "Updated text marker-ccc");
    assert_eq!(
        twit.image_url.as_deref(),
        Some("https://example.com/example3.png")
    );
}

#[actix_rt::test]
async fn a_non_owner_cannot_edit_a_twit() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "edit_victim", "testpass123");
    signup!(&app, "edit_intruder", "testpass123");
    let owner_cookie = login!(&app, "edit_victim", "testpass123");
    let intruder_cookie = login!(&app, "edit_intruder", "testpass123");

    let twit_id = post_twit!(&app, owner_cookie, "Protected twit marker-ddd");

    let req = test::TestRequest::get()
        .uri(&format!("/twits/{}/edit/", twit_id))
        .cookie(intruder_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let form = vec![
        ("body".to_owned(), "Hijacked text".to_owned()),
        ("image_url".to_owned(), String::new()),
    ];
    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/edit/", twit_id))
        .cookie(intruder_cookie)
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let twit = common::twit_by_id(twit_id).await.expect("twit vanished");
    assert_eq!(twit.body, "Protected twit marker-ddd");
}

#[actix_rt::test]
async fn an_anonymous_edit_redirects_to_login() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "anon_target", "testpass123");
    let cookie = login!(&app, "anon_target", "testpass123");
    let twit_id = post_twit!(&app, cookie, "Anonymous edit target marker-eee");

    let form = vec![
        ("body".to_owned(), "Drive-by edit".to_owned()),
        ("image_url".to_owned(), String::new()),
    ];
    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/edit/", twit_id))
        .set_form(&form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location_header(&resp), "/accounts/login/");
}

#[actix_rt::test]
async fn deleting_a_twit_cascades_to_comments_and_likes() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "demolisher", "testpass123");
    signup!(&app, "bystander_d", "testpass123");
    let owner_cookie = login!(&app, "demolisher", "testpass123");
    let bystander_cookie = login!(&app, "bystander_d", "testpass123");

    let twit_id = post_twit!(&app, owner_cookie, "Doomed twit marker-fff");
    post_comment!(&app, bystander_cookie, twit_id, "Doomed comment marker-fff");

    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/like/", twit_id))
        .cookie(bystander_cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert_eq!(common::comment_count_for_twit(twit_id).await, 1);
    assert_eq!(common::like_count_for_twit(twit_id).await, 1);

    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/delete/", twit_id))
        .cookie(owner_cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert!(common::twit_by_id(twit_id).await.is_none());
    assert_eq!(common::comment_count_for_twit(twit_id).await, 0);
    assert_eq!(common::like_count_for_twit(twit_id).await, 0);
}

#[actix_rt::test]
async fn a_non_owner_cannot_delete_a_twit() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "keeper", "testpass123");
    signup!(&app, "grim_reaper", "testpass123");
    let owner_cookie = login!(&app, "keeper", "testpass123");
    let intruder_cookie = login!(&app, "grim_reaper", "testpass123");

    let twit_id = post_twit!(&app, owner_cookie, "Sturdy twit marker-ggg");

    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/delete/", twit_id))
        .cookie(intruder_cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(common::twit_by_id(twit_id).await.is_some());
}

#[actix_rt::test]
async fn liking_toggles_the_count() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "likeable", "testpass123");
    signup!(&app, "fan", "testpass123");
    let author_cookie = login!(&app, "likeable", "testpass123");
    let fan_cookie = login!(&app, "fan", "testpass123");

    let twit_id = post_twit!(&app, author_cookie, "Likeable twit marker-hhh");

    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/like/", twit_id))
        .cookie(fan_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::like_count_for_twit(twit_id).await, 1);

    let req = test::TestRequest::get()
        .uri(&format!("/twits/{}/", twit_id))
        .cookie(fan_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = common::read_body_string(resp).await;
    assert!(body.contains(r#"<span class="like_count">1</span>"#));
    assert!(body.contains("Unlike"));

    // A second like from the same user toggles it back off.
    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/like/", twit_id))
        .cookie(fan_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::like_count_for_twit(twit_id).await, 0);

    let req = test::TestRequest::get()
        .uri(&format!("/twits/{}/", twit_id))
        .cookie(fan_cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = common::read_body_string(resp).await;
    assert!(body.contains(r#"<span class="like_count">0</span>"#));
}

#[actix_rt::test]
async fn each_distinct_user_counts_for_one_like() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "popular", "testpass123");
    signup!(&app, "admirer", "testpass123");
    let author_cookie = login!(&app, "popular", "testpass123");
    let admirer_cookie = login!(&app, "admirer", "testpass123");

    let twit_id = post_twit!(&app, author_cookie, "Popular twit marker-iii");

    for cookie in [&author_cookie, &admirer_cookie] {
        let req = test::TestRequest::post()
            .uri(&format!("/twits/{}/like/", twit_id))
            .cookie((*cookie).clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    assert_eq!(common::like_count_for_twit(twit_id).await, 2);
}

#[actix_rt::test]
async fn an_anonymous_like_redirects_to_login() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "unliked", "testpass123");
    let cookie = login!(&app, "unliked", "testpass123");
    let twit_id = post_twit!(&app, cookie, "Unliked twit marker-jjj");

    let req = test::TestRequest::post()
        .uri(&format!("/twits/{}/like/", twit_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location_header(&resp), "/accounts/login/");
    assert_eq!(common::like_count_for_twit(twit_id).await, 0);
}

#[actix_rt::test]
async fn a_missing_twit_is_404() {
    common::setup("twits-test").await;
    let app = test_app!();

    signup!(&app, "searcher", "testpass123");
    let cookie = login!(&app, "searcher", "testpass123");

    let req = test::TestRequest::get()
        .uri("/twits/999999/")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/twits/999999/edit/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
