//! Random authors and lorem text for seeding.

use blog_posts::db::{Author, NewPost};
use fake::faker::lorem::en::{Paragraphs, Sentence};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;

pub fn author<R: Rng + ?Sized>(rng: &mut R) -> Author {
    Author::new(
        FirstName().fake_with_rng::<String, _>(rng),
        LastName().fake_with_rng::<String, _>(rng),
    )
}

/// One to three paragraphs, blank-line separated.
pub fn text<R: Rng + ?Sized>(rng: &mut R) -> String {
    Paragraphs(1..4).fake_with_rng::<Vec<String>, _>(rng).join("\n\n")
}

pub fn new_post<R: Rng + ?Sized>(rng: &mut R) -> NewPost {
    NewPost {
        author: author(rng),
        title: Sentence(4..10).fake_with_rng(rng),
        content: text(rng),
    }
}
