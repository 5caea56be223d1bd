use std::path::Path;

use super::*;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("gallery_admin").chain(args.iter().copied()))
        .expect("parse")
}

fn workspace_args(dir: &Path) -> Vec<String> {
    vec![
        "--database-url".into(),
        format!("sqlite://{}", dir.join("gallery.db").display()),
        "--media-root".into(),
        dir.join("media").display().to_string(),
        "--media-public-url".into(),
        "http://localhost/media".into(),
    ]
}

fn cli_in(dir: &Path, command: &[&str]) -> Cli {
    let mut args = workspace_args(dir);
    args.extend(command.iter().map(|arg| arg.to_string()));
    Cli::try_parse_from(std::iter::once("gallery_admin".to_string()).chain(args)).expect("parse")
}

async fn open_storage(dir: &Path) -> Storage {
    Storage::new(&format!("sqlite://{}", dir.join("gallery.db").display()))
        .await
        .expect("storage")
}

#[test]
fn create_parses_header_label_and_images() {
    let parsed = cli(&[
        "create",
        "--header",
        "Saree Draping",
        "--description",
        "Nivi drape",
        "--main",
        "1",
        "a.jpg",
        "b.png",
    ]);

    match parsed.command {
        Command::Create {
            header,
            description,
            main,
            images,
        } => {
            assert_eq!(header, ServiceHeader::SareeDraping);
            assert_eq!(description, "Nivi drape");
            assert_eq!(main, Some(1));
            assert_eq!(images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn unknown_header_is_rejected_at_parse_time() {
    let result = Cli::try_parse_from([
        "gallery_admin",
        "create",
        "--header",
        "hairstyle",
        "--description",
        "x",
        "a.jpg",
    ]);
    assert!(result.is_err());
}

#[test]
fn create_requires_at_least_one_image() {
    let result = Cli::try_parse_from([
        "gallery_admin",
        "create",
        "--header",
        "Hairstyle",
        "--description",
        "x",
    ]);
    assert!(result.is_err());
}

#[test]
fn edit_images_are_optional() {
    let parsed = cli(&["edit", "4", "--description", "Updated"]);
    match parsed.command {
        Command::Edit {
            item_id,
            header,
            description,
            images,
            ..
        } => {
            assert_eq!(item_id, 4);
            assert_eq!(header, None);
            assert_eq!(description.as_deref(), Some("Updated"));
            assert!(images.is_empty());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn delete_prompt_accepts_only_yes() {
    assert!(is_yes("y\n"));
    assert!(is_yes("  YES "));
    assert!(!is_yes("\n"));
    assert!(!is_yes("n"));
    assert!(!is_yes("yep"));
}

#[test]
fn file_name_uses_last_component() {
    assert_eq!(
        file_name(Path::new("/tmp/shoot/look.jpg")).expect("name"),
        "look.jpg"
    );
    assert!(file_name(Path::new("/")).is_err());
}

#[tokio::test]
async fn create_edit_and_delete_round_through_storage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("first.jpg");
    let second = dir.path().join("second.png");
    tokio::fs::write(&first, b"first").await.expect("write");
    tokio::fs::write(&second, b"second").await.expect("write");

    run(cli_in(
        dir.path(),
        &[
            "create",
            "--header",
            "Hairstyle",
            "--description",
            "Bridal bun",
            "--main",
            "1",
            first.to_str().expect("utf8"),
            second.to_str().expect("utf8"),
        ],
    ))
    .await
    .expect("create");

    let storage = open_storage(dir.path()).await;
    let items = storage
        .list_items(Some(ServiceHeader::Hairstyle))
        .await
        .expect("list");
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.description, "Bridal bun");
    assert!(item.main_image_url.ends_with(".png"));
    assert_eq!(item.images.len(), 1);
    assert!(item.images[0].image_url.ends_with(".jpg"));

    run(cli_in(
        dir.path(),
        &["edit", &item.id.0.to_string(), "--description", "Low bun"],
    ))
    .await
    .expect("edit");

    let edited = storage
        .get_item(item.id)
        .await
        .expect("get")
        .expect("still there");
    assert_eq!(edited.description, "Low bun");
    assert_eq!(edited.main_image_url, item.main_image_url);
    assert!(edited.images.is_empty());

    run(cli_in(dir.path(), &["delete", &item.id.0.to_string(), "--yes"]))
        .await
        .expect("delete");

    assert!(storage.get_item(item.id).await.expect("get").is_none());
}

#[tokio::test]
async fn main_index_out_of_range_commits_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("only.jpg");
    tokio::fs::write(&image, b"only").await.expect("write");

    let result = run(cli_in(
        dir.path(),
        &[
            "create",
            "--header",
            "Certificates",
            "--description",
            "Diploma",
            "--main",
            "3",
            image.to_str().expect("utf8"),
        ],
    ))
    .await;

    assert!(result.is_err());
    let storage = open_storage(dir.path()).await;
    assert!(storage.list_items(None).await.expect("list").is_empty());
}

#[tokio::test]
async fn headers_and_tokens_need_no_database() {
    let dir = tempfile::tempdir().expect("tempdir");

    run(cli_in(dir.path(), &["headers"])).await.expect("headers");
    run(cli_in(
        dir.path(),
        &["mint-token", "--subject", "owner", "--secret", "s3cret"],
    ))
    .await
    .expect("mint");

    assert!(!dir.path().join("gallery.db").exists());
}
