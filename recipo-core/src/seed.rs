//! Demo catalogue for a fresh database.

use tokio_rusqlite::Connection;

use crate::db::now_secs;

struct SeedRecipe {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    country: &'static str,
    difficulty: &'static str,
    time: &'static str,
    ingredients: &'static [&'static str],
    instructions: &'static [&'static str],
}

const COUNTRIES: &[(&str, &str)] = &[
    ("italy", "Italy"),
    ("japan", "Japan"),
    ("mexico", "Mexico"),
    ("india", "India"),
];

const RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        slug: "spaghetti-carbonara",
        title: "Spaghetti Carbonara",
        description: "Roman pasta with egg, pecorino and guanciale.",
        country: "italy",
        difficulty: "medium",
        time: "25 min",
        ingredients: &["200g spaghetti", "100g guanciale", "2 egg yolks", "50g pecorino", "black pepper"],
        instructions: &[
            "Boil the pasta in salted water.",
            "Crisp the guanciale in a dry pan.",
            "Whisk yolks with grated pecorino and pepper.",
            "Toss pasta with guanciale off the heat, then stir in the egg mix.",
        ],
    },
    SeedRecipe {
        slug: "margherita-pizza",
        title: "Margherita Pizza",
        description: "Tomato, mozzarella and basil on a thin crust.",
        country: "italy",
        difficulty: "hard",
        time: "2 h",
        ingredients: &["pizza dough", "200g passata", "125g mozzarella", "fresh basil", "olive oil"],
        instructions: &[
            "Stretch the dough thin.",
            "Spread passata and tear over the mozzarella.",
            "Bake on a hot stone for 8 minutes.",
            "Finish with basil and oil.",
        ],
    },
    SeedRecipe {
        slug: "miso-soup",
        title: "Miso Soup",
        description: "Dashi broth with miso, tofu and wakame.",
        country: "japan",
        difficulty: "easy",
        time: "15 min",
        ingredients: &["500ml dashi", "3 tbsp white miso", "150g silken tofu", "1 tbsp wakame", "spring onion"],
        instructions: &[
            "Warm the dashi without boiling.",
            "Dissolve the miso in a ladle of broth and stir it back in.",
            "Add cubed tofu and wakame, heat through, top with onion.",
        ],
    },
    SeedRecipe {
        slug: "tacos-al-pastor",
        title: "Tacos al Pastor",
        description: "Chile-marinated pork with pineapple on corn tortillas.",
        country: "mexico",
        difficulty: "medium",
        time: "1 h",
        ingredients: &["500g pork shoulder", "3 guajillo chiles", "pineapple", "corn tortillas", "onion", "coriander"],
        instructions: &[
            "Blend soaked chiles into a marinade and coat the pork.",
            "Sear the pork with pineapple until charred.",
            "Slice thin and serve in warm tortillas with onion and coriander.",
        ],
    },
    SeedRecipe {
        slug: "chana-masala",
        title: "Chana Masala",
        description: "Chickpeas simmered in a spiced tomato gravy.",
        country: "india",
        difficulty: "easy",
        time: "40 min",
        ingredients: &["2 cans chickpeas", "1 onion", "2 tomatoes", "ginger", "garlic", "garam masala"],
        instructions: &[
            "Fry onion, ginger and garlic until golden.",
            "Add tomatoes and spices, cook to a thick paste.",
            "Stir in chickpeas with a splash of water and simmer 20 minutes.",
        ],
    },
];

/// Inserts the demo countries and recipes when the catalogue is empty.
///
/// Returns `true` if anything was inserted.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the insert transaction fails.
pub async fn seed_demo_data(conn: &Connection) -> Result<bool, tokio_rusqlite::Error> {
    let inserted = conn
        .call(|db| {
            let existing: i64 = db.query_row("SELECT COUNT(*) FROM recipes", [], |r| r.get(0))?;
            if existing > 0 {
                return Ok::<_, rusqlite::Error>(false);
            }

            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            for (slug, name) in COUNTRIES {
                tx.execute(
                    "INSERT INTO countries (id, name, slug) VALUES (?1, ?2, ?3)
                     ON CONFLICT(slug) DO NOTHING",
                    rusqlite::params![uuid::Uuid::new_v4().to_string(), name, slug],
                )?;
            }

            // Older entries first so the listing shows the last one on top.
            let base = now_secs() - RECIPES.len() as i64;
            for (i, r) in RECIPES.iter().enumerate() {
                let ingredients = serde_json::to_string(r.ingredients).unwrap_or_else(|_| "[]".into());
                let instructions = serde_json::to_string(r.instructions).unwrap_or_else(|_| "[]".into());
                tx.execute(
                    "INSERT INTO recipes (id, slug, title, description, country_id, difficulty,
                                          time, ingredients, instructions, created_at)
                     SELECT ?1, ?2, ?3, ?4, c.id, ?6, ?7, ?8, ?9, ?10
                     FROM countries c WHERE c.slug = ?5",
                    rusqlite::params![
                        uuid::Uuid::new_v4().to_string(),
                        r.slug,
                        r.title,
                        r.description,
                        r.country,
                        r.difficulty,
                        r.time,
                        ingredients,
                        instructions,
                        base + i as i64,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
        .await?;

    if inserted {
        tracing::info!(recipes = RECIPES.len(), "seeded demo catalogue");
    }
    Ok(inserted)
}
