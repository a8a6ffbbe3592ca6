//! Imposter word categories.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Locations,
    Animals,
    Food,
    Movies,
    Jobs,
    Sports,
    Countries,
    Superheroes,
    Disney,
    Tricky,
    /// Players type their own secret item.
    Custom,
}

impl Category {
    /// Setup dropdown order.
    pub const ALL: [Category; 11] = [
        Self::Locations,
        Self::Animals,
        Self::Food,
        Self::Movies,
        Self::Jobs,
        Self::Sports,
        Self::Countries,
        Self::Superheroes,
        Self::Disney,
        Self::Tricky,
        Self::Custom,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Locations => "locations",
            Self::Animals => "animals",
            Self::Food => "food",
            Self::Movies => "movies",
            Self::Jobs => "jobs",
            Self::Sports => "sports",
            Self::Countries => "countries",
            Self::Superheroes => "superheroes",
            Self::Disney => "disney",
            Self::Tricky => "tricky",
            Self::Custom => "custom",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Locations => "\u{1F3E2} Locations",
            Self::Animals => "\u{1F43E} Animals",
            Self::Food => "\u{1F355} Food & Drinks",
            Self::Movies => "\u{1F3AC} Movies",
            Self::Jobs => "\u{1F4BC} Jobs/Professions",
            Self::Sports => "\u{26BD} Sports & Activities",
            Self::Countries => "\u{1F30D} Countries",
            Self::Superheroes => "\u{1F9B8} Superheroes",
            Self::Disney => "\u{1F3F0} Disney Characters",
            Self::Tricky => "\u{1F9E0} Abstract Concepts (Hard)",
            Self::Custom => "\u{270F}\u{FE0F} Custom Item",
        }
    }

    /// Built-in items. Empty for `Custom`.
    pub fn items(self) -> &'static [&'static str] {
        match self {
            Self::Locations => LOCATIONS,
            Self::Animals => ANIMALS,
            Self::Food => FOOD,
            Self::Movies => MOVIES,
            Self::Jobs => JOBS,
            Self::Sports => SPORTS,
            Self::Countries => COUNTRIES,
            Self::Superheroes => SUPERHEROES,
            Self::Disney => DISNEY,
            Self::Tricky => TRICKY,
            Self::Custom => &[],
        }
    }
}

const LOCATIONS: &[&str] = &[
    "Beach", "Restaurant", "School", "Hospital", "Airport", "Movie Theater", "Gym", "Library",
    "Park", "Mall", "Office", "Hotel", "Gas Station", "Grocery Store", "Bank", "Police Station",
    "Fire Station", "Dentist", "Hair Salon", "Coffee Shop", "Zoo", "Museum", "Church", "Subway",
    "Taxi", "Cruise Ship", "Space Station", "Casino", "Circus", "Farm",
];

const ANIMALS: &[&str] = &[
    "Lion", "Elephant", "Penguin", "Dolphin", "Tiger", "Giraffe", "Monkey", "Kangaroo", "Panda",
    "Koala", "Zebra", "Hippo", "Rhino", "Cheetah", "Polar Bear", "Wolf", "Fox", "Rabbit",
    "Squirrel", "Owl", "Eagle", "Shark", "Whale", "Octopus", "Turtle", "Frog", "Snake", "Lizard",
];

const FOOD: &[&str] = &[
    "Pizza", "Burger", "Sushi", "Tacos", "Ice Cream", "Chocolate", "Pasta", "Sandwich", "Salad",
    "Soup", "Cookies", "Cake", "Pancakes", "Waffles", "Coffee", "Tea", "Smoothie", "Hot Dog",
    "Popcorn", "Cheese", "Bread", "Apple", "Banana", "Orange", "Strawberry", "Avocado",
    "Broccoli",
];

const MOVIES: &[&str] = &[
    "The Lion King", "Titanic", "Avatar", "Star Wars", "Harry Potter", "The Avengers", "Frozen",
    "Toy Story", "Finding Nemo", "Shrek", "The Dark Knight", "Jurassic Park", "E.T.",
    "The Matrix", "Forrest Gump", "The Godfather", "Jaws", "Rocky", "Home Alone",
    "Back to the Future",
];

const JOBS: &[&str] = &[
    "Doctor", "Teacher", "Chef", "Police Officer", "Firefighter", "Pilot", "Nurse", "Engineer",
    "Lawyer", "Artist", "Musician", "Actor", "Writer", "Photographer", "Dentist", "Veterinarian",
    "Mechanic", "Farmer", "Librarian", "Scientist", "Astronaut", "Judge", "Barber", "Baker",
];

const SPORTS: &[&str] = &[
    "Soccer", "Basketball", "Tennis", "Swimming", "Baseball", "Football", "Golf", "Volleyball",
    "Hockey", "Boxing", "Wrestling", "Skiing", "Snowboarding", "Surfing", "Skateboarding",
    "Cycling", "Running", "Gymnastics", "Dance", "Yoga", "Rock Climbing", "Bowling", "Fishing",
];

const COUNTRIES: &[&str] = &[
    "United States", "Canada", "Mexico", "Brazil", "United Kingdom", "France", "Germany",
    "Italy", "Spain", "Russia", "China", "Japan", "India", "Australia", "South Africa", "Egypt",
    "Morocco", "Kenya", "Nigeria", "Argentina", "Chile", "Peru", "Thailand", "South Korea",
    "Indonesia",
];

const SUPERHEROES: &[&str] = &[
    "Superman", "Batman", "Spider-Man", "Wonder Woman", "Iron Man", "Captain America", "Thor",
    "Hulk", "Flash", "Green Lantern", "Aquaman", "Black Widow", "Hawkeye", "Black Panther",
    "Captain Marvel", "Ant-Man", "Deadpool", "Wolverine", "Storm", "Cyclops", "Jean Grey",
    "Professor X", "Magneto",
];

const DISNEY: &[&str] = &[
    "Mickey Mouse", "Minnie Mouse", "Donald Duck", "Goofy", "Pluto", "Elsa", "Anna", "Olaf",
    "Simba", "Mufasa", "Ariel", "Belle", "Cinderella", "Snow White", "Jasmine", "Aladdin",
    "Mulan", "Pocahontas", "Moana", "Rapunzel", "Tiana", "Merida", "Buzz Lightyear", "Woody",
    "Nemo",
];

const TRICKY: &[&str] = &[
    "Rubber Duck", "Paper Clip", "Shoelace", "Doorknob", "Light Switch", "Belly Button",
    "Shadow", "Hiccup", "Yawn", "Sneeze", "Brain Freeze", "D\u{e9}j\u{e0} Vu", "Goosebumps",
    "Static Electricity", "Awkward Silence", "Inside Joke", "White Lie", "Gut Feeling",
    "Split Second", "Lost Thought", "Muscle Memory", "Habit", "Reflex", "Instinct", "Intuition",
    "Nostalgia", "Procrastination", "Stage Fright", "Writer's Block", "Butterflies in Stomach",
    "Cold Feet", "Green Thumb", "Sweet Tooth", "Heavy Heart", "Bright Idea", "Sharp Tongue",
    "Thick Skin", "Open Mind", "Sixth Sense", "Common Sense", "Tunnel Vision", "Silver Lining",
    "Mixed Feelings", "Second Wind", "Breaking Point", "Comfort Zone", "Gray Area",
    "Turning Point",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_category_has_items() {
        for category in Category::ALL {
            if category == Category::Custom {
                assert!(category.items().is_empty());
            } else {
                assert!(!category.items().is_empty(), "{:?} is empty", category);
            }
        }
    }

    #[test]
    fn keys_parse_back() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.key()), Some(category));
        }
        assert_eq!(Category::parse("vegetables"), None);
    }
}
