use chrono::{DateTime, FixedOffset, TimeZone};
use gitlab_files_core::config::UploaderConfig;
use gitlab_files_core::error::UploaderError;
use gitlab_files_core::image::{PreparedImage, RemovedImage, UPLOADER_ID};
use gitlab_files_core::operation::{build_remove_request, build_upload_request};
use gitlab_files_core::request::{
    file_url, project_info, raw_url, remove_multi_files, remove_single_file, upload_multi_files,
    upload_single_file, Method, USER_AGENT,
};
use serde_json::json;

fn fixed_now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 9, 7, 3, 5)
        .unwrap()
}

fn config(git_url: &str) -> UploaderConfig {
    UploaderConfig {
        git_url: git_url.to_string(),
        project_id: 42,
        branch: "main".to_string(),
        git_token: "secret-token".to_string(),
        path_template: "/pictures/{year}/{fileName}".to_string(),
        commit_message: "Upload {fileName} at {year}".to_string(),
        delete_message: "Delete {fileName} at {year}".to_string(),
        author_mail: "dev@example.com".to_string(),
        author_name: "dev".to_string(),
        delete_remote: true,
        delete_inform: false,
        legacy_server: false,
    }
}

fn prepared(name: &str, path: &str) -> PreparedImage {
    PreparedImage {
        file_name: name.to_string(),
        extname: ".png".to_string(),
        destination_path: path.to_string(),
        base64: "aGVsbG8=".to_string(),
    }
}

fn removed(name: &str, path: Option<&str>) -> RemovedImage {
    RemovedImage {
        file_name: name.to_string(),
        ext_name: ".png".to_string(),
        destination_path: path.map(str::to_string),
        kind: UPLOADER_ID.to_string(),
    }
}

#[test]
fn project_info_is_a_token_authenticated_get() {
    let req = project_info(&config("https://gitlab.example.com"), &fixed_now());
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.url, "https://gitlab.example.com/api/v4/projects/42");
    assert_eq!(req.header("PRIVATE-TOKEN"), Some("secret-token"));
    assert_eq!(req.header("Date"), Some("Thu, 09 May 2024 07:03:05 GMT"));
    assert_eq!(req.header("Content-Type"), None);
    assert!(req.body.is_none());
}

#[test]
fn trailing_slash_in_base_url_does_not_change_urls() {
    let now = fixed_now();
    let with = config("https://gitlab.example.com/");
    let without = config("https://gitlab.example.com");

    assert_eq!(project_info(&with, &now).url, project_info(&without, &now).url);
    assert_eq!(
        upload_single_file(&with, "a%2Fb.png", "m", "x", &now).url,
        upload_single_file(&without, "a%2Fb.png", "m", "x", &now).url
    );
    let images = [prepared("a.png", "a/b.png"), prepared("c.png", "c.png")];
    assert_eq!(
        upload_multi_files(&with, &images, &now).url,
        upload_multi_files(&without, &images, &now).url
    );
}

#[test]
fn single_upload_posts_base64_content_to_files_endpoint() {
    let req = upload_single_file(
        &config("https://gitlab.example.com"),
        "pictures%2F2024%2Fphoto.png",
        "Upload photo.png",
        "aGVsbG8=",
        &fixed_now(),
    );
    assert_eq!(req.method, Method::Post);
    assert_eq!(
        req.url,
        "https://gitlab.example.com/api/v4/projects/42/repository/files/pictures%2F2024%2Fphoto.png"
    );
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("User-Agent"), Some(USER_AGENT));
    assert_eq!(
        req.body,
        Some(json!({
            "branch": "main",
            "author_email": "dev@example.com",
            "author_name": "dev",
            "encoding": "base64",
            "commit_message": "Upload photo.png",
            "content": "aGVsbG8=",
        }))
    );
}

#[test]
fn single_delete_targets_same_url_as_single_upload() {
    let cfg = config("https://gitlab.example.com");
    let now = fixed_now();
    let up = upload_single_file(&cfg, "a%2Fb.png", "m", "x", &now);
    let del = remove_single_file(&cfg, "a%2Fb.png", "Delete b.png", &now);

    assert_eq!(up.url, del.url);
    assert_eq!(del.method, Method::Delete);
    assert_eq!(
        del.body,
        Some(json!({
            "branch": "main",
            "author_email": "dev@example.com",
            "author_name": "dev",
            "commit_message": "Delete b.png",
        }))
    );
}

#[test]
fn batch_upload_creates_one_action_per_image() {
    let images = [
        prepared("a.png", "pictures/2024/a.png"),
        prepared("b.jpg", "pictures/2024/b.jpg"),
    ];
    let req = upload_multi_files(&config("https://gitlab.example.com"), &images, &fixed_now());

    assert_eq!(req.method, Method::Post);
    assert_eq!(
        req.url,
        "https://gitlab.example.com/api/v4/projects/42/repository/commits"
    );
    assert_eq!(
        req.body,
        Some(json!({
            "id": 42,
            "branch": "main",
            "commit_message": "Upload \"a.png\" & \"b.jpg\" at 2024",
            "author_email": "dev@example.com",
            "author_name": "dev",
            "actions": [
                {"action": "create", "file_path": "pictures/2024/a.png", "encoding": "base64", "content": "aGVsbG8="},
                {"action": "create", "file_path": "pictures/2024/b.jpg", "encoding": "base64", "content": "aGVsbG8="},
            ],
        }))
    );
}

#[test]
fn batch_delete_uses_delete_message_and_path_only_actions() {
    let files = [removed("a.png", Some("p/a.png")), removed("b.png", Some("p/b.png"))];
    let req = remove_multi_files(&config("https://gitlab.example.com"), &files, &fixed_now())
        .expect("paths are recorded");

    let body = req.body.expect("commit body");
    assert_eq!(body["commit_message"], "Delete \"a.png\" & \"b.png\" at 2024");
    assert_eq!(
        body["actions"],
        json!([
            {"action": "delete", "file_path": "p/a.png"},
            {"action": "delete", "file_path": "p/b.png"},
        ])
    );
}

#[test]
fn batch_delete_without_recorded_path_is_rejected() {
    let files = [removed("a.png", Some("p/a.png")), removed("b.png", None)];
    let err = remove_multi_files(&config("https://gitlab.example.com"), &files, &fixed_now())
        .unwrap_err();
    assert!(matches!(err, UploaderError::InvalidImage(_)));
}

#[test]
fn one_image_selects_single_endpoint_with_escaped_path() {
    let cfg = config("https://gitlab.example.com");
    let now = fixed_now();

    let single = build_upload_request(&cfg, &[prepared("a.png", "pictures/2024/a.png")], &now);
    assert!(single.url.ends_with("/repository/files/pictures%2F2024%2Fa.png"));
    assert_eq!(single.body.unwrap()["commit_message"], "Upload a.png at 2024");

    let batch = build_upload_request(
        &cfg,
        &[prepared("a.png", "p/a.png"), prepared("b.png", "p/b.png")],
        &now,
    );
    assert!(batch.url.ends_with("/repository/commits"));
}

#[test]
fn one_removal_selects_single_delete_with_escaped_path() {
    let cfg = config("https://gitlab.example.com");
    let req = build_remove_request(&cfg, &[removed("a.png", Some("p/2024/a.png"))], &fixed_now())
        .expect("request builds");
    assert_eq!(req.method, Method::Delete);
    assert!(req.url.ends_with("/repository/files/p%2F2024%2Fa.png"));
    assert_eq!(req.body.unwrap()["commit_message"], "Delete a.png at 2024");
}

#[test]
fn legacy_flag_only_changes_raw_prefix() {
    let modern = config("https://gitlab.example.com");
    let legacy = UploaderConfig {
        legacy_server: true,
        ..config("https://gitlab.example.com")
    };
    let web_url = "https://gitlab.example.com/group/images";

    assert_eq!(
        raw_url(&modern, web_url, "p/a.png"),
        "https://gitlab.example.com/group/images/-/raw/main/p/a.png"
    );
    assert_eq!(
        raw_url(&legacy, web_url, "p/a.png"),
        "https://gitlab.example.com/group/images/raw/main/p/a.png"
    );

    let now = fixed_now();
    assert_eq!(project_info(&modern, &now), project_info(&legacy, &now));
    assert_eq!(
        upload_single_file(&modern, "a.png", "m", "x", &now),
        upload_single_file(&legacy, "a.png", "m", "x", &now)
    );
}

#[test]
fn file_url_encodes_characters_that_would_cut_the_path() {
    let config = config("https://gitlab.com");
    let base = "https://gitlab.com/api/v4/projects/42/repository/files/";

    assert_eq!(
        file_url(&config, "pictures%2Fshot#1.png"),
        format!("{base}pictures%2Fshot%231.png")
    );
    assert_eq!(
        file_url(&config, "a?b c.png"),
        format!("{base}a%3Fb%20c.png")
    );
    assert_eq!(
        file_url(&config, "pictures%2F2024%2Fa.png"),
        format!("{base}pictures%2F2024%2Fa.png")
    );
}
