#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Cursor;

use city_library::{LibraryManager, StoreConfig, console::Console};
use tempfile::TempDir;

/// Feed `script` to a console over a fresh catalog and return everything it printed
fn run_script(dir: &TempDir, script: &str) -> (String, LibraryManager) {
    let mut manager = LibraryManager::new(StoreConfig::in_dir(dir.path()));
    manager.load_from_file();

    let mut console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    console.run(&mut manager).unwrap();
    let output = String::from_utf8(console.into_output()).unwrap();
    (output, manager)
}

#[test]
fn add_issue_and_return_through_the_menu() {
    let dir = TempDir::new().unwrap();
    let script = "1\nDune\nFrank Herbert\nFiction\n\
                  2\nAda\nada@example.com\n\
                  3\n101\n201\n\
                  3\n101\n201\n\
                  4\n101\n201\n\
                  7\n";
    let (output, manager) = run_script(&dir, script);

    assert!(output.contains("Book added successfully with ID: 101"));
    assert!(output.contains("Member added successfully with ID: 201"));
    assert!(output.contains("Book 101 issued to Member 201 successfully."));
    assert!(output.contains("Error: Book is already issued."));
    assert!(output.contains("Book 101 returned successfully by Member 201."));
    assert!(output.ends_with("Exiting system. Data saved.\n"));
    assert!(!manager.book(101).unwrap().is_issued());
}

#[test]
fn bad_input_is_reported_and_the_loop_continues() {
    let dir = TempDir::new().unwrap();
    let script = "abc\n9\n3\nxyz\n3\n555\n1\n4\n1\nabc\n7\n";
    let (output, _) = run_script(&dir, script);

    assert!(output.contains("Invalid input. Please enter a number."));
    assert!(output.contains("Invalid choice. Please try again."));
    assert_eq!(output.matches("Error: Invalid ID format.").count(), 2);
    assert!(output.contains("Error: Book ID not found."));
    assert!(output.ends_with("Exiting system. Data saved.\n"));
}

#[test]
fn search_and_sort_listings() {
    let dir = TempDir::new().unwrap();
    let script = "1\nZeta\nA\nFiction\n\
                  1\nAlpha\nB\nDrama\n\
                  5\nfiction\n\
                  5\npoetry\n\
                  6\n2\n\
                  7\n";
    let (output, _) = run_script(&dir, script);

    assert!(output.contains("ID: 101, Title: Zeta, Author: A, Category: Fiction, Issued: false"));
    assert!(output.contains("No books found matching the search term."));

    let sorted = output.rsplit("Sort by:").next().unwrap();
    let zeta = sorted.find("Title: Zeta").unwrap();
    let alpha = sorted.find("Title: Alpha").unwrap();
    assert!(zeta < alpha, "author A sorts before author B");
}

#[test]
fn unknown_sort_choice_sorts_by_title() {
    let dir = TempDir::new().unwrap();
    let script = "1\nMid\nA\nC\n1\nAlpha\nB\nC\n6\nwhatever\n7\n";
    let (output, _) = run_script(&dir, script);

    let sorted = output.rsplit("Sort by:").next().unwrap();
    assert!(sorted.find("Title: Alpha").unwrap() < sorted.find("Title: Mid").unwrap());
}

#[test]
fn end_of_input_saves_and_exits() {
    let dir = TempDir::new().unwrap();
    let (output, _) = run_script(&dir, "2\nAda\nada@example.com\n");
    assert!(output.ends_with("Exiting system. Data saved.\n"));

    let mut reloaded = LibraryManager::new(StoreConfig::in_dir(dir.path()));
    reloaded.load_from_file();
    assert_eq!(reloaded.member(201).unwrap().name(), "Ada");
}

#[test]
fn load_problems_are_printed() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::in_dir(dir.path());
    std::fs::write(&config.members_path, "{").unwrap();

    let mut manager = LibraryManager::new(config);
    let problems = manager.load_from_file();
    let mut console = Console::new(Cursor::new(Vec::new()), Vec::new());
    console.report_load_errors(&problems).unwrap();

    let output = String::from_utf8(console.into_output()).unwrap();
    assert!(output.starts_with("Error loading data from files: malformed data in"));
}

#[test]
fn negative_menu_number_is_an_invalid_choice() {
    let dir = TempDir::new().unwrap();
    let (output, _) = run_script(&dir, "-1\n99999999999\n7\n");

    assert_eq!(output.matches("Invalid choice. Please try again.").count(), 2);
    assert!(!output.contains("Invalid input. Please enter a number."));
}
