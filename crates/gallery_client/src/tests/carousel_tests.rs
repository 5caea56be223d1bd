use super::*;

#[test]
fn next_wraps_after_full_cycle() {
    let mut carousel = CarouselState::default();
    let item = ItemId(1);

    let visited: Vec<usize> = (0..4).map(|_| carousel.next(item, 4)).collect();

    assert_eq!(visited, vec![1, 2, 3, 0]);
    assert_eq!(carousel.index(item), 0);
}

#[test]
fn previous_from_start_goes_to_last() {
    let mut carousel = CarouselState::default();
    assert_eq!(carousel.previous(ItemId(3), 5), 4);
    assert_eq!(carousel.previous(ItemId(3), 5), 3);
}

#[test]
fn items_move_independently() {
    let mut carousel = CarouselState::default();
    carousel.next(ItemId(1), 3);
    carousel.next(ItemId(1), 3);

    assert_eq!(carousel.index(ItemId(1)), 2);
    assert_eq!(carousel.index(ItemId(2)), 0);
}

#[test]
fn zero_length_does_not_move() {
    let mut carousel = CarouselState::default();
    carousel.next(ItemId(1), 3);

    assert_eq!(carousel.next(ItemId(1), 0), 1);
    assert_eq!(carousel.previous(ItemId(1), 0), 1);
}

#[test]
fn single_image_stays_put() {
    let mut carousel = CarouselState::default();
    assert_eq!(carousel.next(ItemId(9), 1), 0);
    assert_eq!(carousel.previous(ItemId(9), 1), 0);
}

#[test]
fn reset_returns_every_item_to_start() {
    let mut carousel = CarouselState::default();
    carousel.next(ItemId(1), 3);
    carousel.previous(ItemId(2), 3);

    carousel.reset();

    assert_eq!(carousel.index(ItemId(1)), 0);
    assert_eq!(carousel.index(ItemId(2)), 0);
}
