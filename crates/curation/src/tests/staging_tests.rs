use super::*;

fn staged(names: &[&str]) -> StagingArea {
    let mut staging = StagingArea::default();
    for name in names {
        staging.stage(*name, name.as_bytes().to_vec()).expect("stage");
    }
    staging
}

#[test]
fn staging_keeps_insertion_order() {
    let staging = staged(&["a.jpg", "b.png", "c.webp"]);
    let names: Vec<&str> = staging
        .images()
        .iter()
        .map(|image| image.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.jpg", "b.png", "c.webp"]);
}

#[test]
fn flagging_one_image_clears_every_other_flag() {
    let mut staging = staged(&["a.jpg", "b.jpg", "c.jpg"]);

    assert!(staging.toggle_main(0).expect("toggle"));
    assert!(staging.toggle_main(2).expect("toggle"));

    let flagged: Vec<usize> = staging
        .images()
        .iter()
        .enumerate()
        .filter(|(_, image)| image.is_main)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(flagged, vec![2]);
    assert_eq!(staging.main_index(), Some(2));
}

#[test]
fn toggling_the_main_image_again_unflags_it() {
    let mut staging = staged(&["a.jpg", "b.jpg"]);
    assert!(staging.toggle_main(1).expect("toggle"));
    assert!(!staging.toggle_main(1).expect("toggle"));
    assert_eq!(staging.flagged_main(), None);
    assert_eq!(staging.main_index(), Some(0));
}

#[test]
fn empty_staging_has_no_main() {
    assert_eq!(StagingArea::default().main_index(), None);
}

#[test]
fn rejects_non_images_and_empty_files() {
    let mut staging = StagingArea::default();
    let err = staging
        .stage("notes.txt", b"hello".to_vec())
        .expect_err("text file");
    assert_eq!(err.field, FormField::Images);

    let err = staging.stage("empty.jpg", Vec::new()).expect_err("empty");
    assert_eq!(err.field, FormField::Images);
    assert!(staging.is_empty());
}

#[test]
fn out_of_range_indexes_are_validation_errors() {
    let mut staging = staged(&["a.jpg"]);
    assert!(staging.toggle_main(3).is_err());
    assert!(staging.unstage(1).is_err());
    let removed = staging.unstage(0).expect("unstage");
    assert_eq!(removed.file_name, "a.jpg");
    assert!(staging.is_empty());
}
