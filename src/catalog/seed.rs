//! Demo records used to seed a fresh catalog

use super::record::Record;

/// The demo catalog, in insertion order.
///
/// Two records share the title "Introduction to Algorithms" so exact title
/// search has ties to order.
pub fn demo_records() -> Vec<Record> {
    vec![
        Record::new(101, "Introduction to Algorithms", "Cormen et al.", 2009, 3),
        Record::new(205, "Design Patterns", "Gamma et al.", 1995, 2),
        Record::new(150, "Clean Code", "Robert C. Martin", 2008, 4),
        Record::new(300, "The Pragmatic Programmer", "Andrew Hunt", 1999, 1),
        Record::new(120, "Introduction to Algorithms", "Cormen et al.", 2009, 1),
        Record::new(220, "Algorithms Unlocked", "Cormen", 2013, 2),
        Record::new(
            180,
            "Data Structures and Algorithms in Python",
            "Goodrich",
            2013,
            2,
        ),
    ]
}
