//! Built-in character catalog.

use super::models::{Character, Element, WeaponType};
use super::{next_id, Tables};

use Element::*;
use WeaponType::*;

const CATALOG: &[(&str, Element, WeaponType, u8, &str)] = &[
    ("Albedo", Geo, Sword, 5, "Mondstadt"),
    ("Alhaitham", Dendro, Sword, 5, "Sumeru"),
    ("Bennett", Pyro, Sword, 4, "Mondstadt"),
    ("Chongyun", Cryo, Claymore, 4, "Liyue"),
    ("Diluc", Pyro, Claymore, 5, "Mondstadt"),
    ("Fischl", Electro, Bow, 4, "Mondstadt"),
    ("Furina", Hydro, Sword, 5, "Fontaine"),
    ("Ganyu", Cryo, Bow, 5, "Liyue"),
    ("Hu Tao", Pyro, Polearm, 5, "Liyue"),
    ("Kaedehara Kazuha", Anemo, Sword, 5, "Inazuma"),
    ("Nahida", Dendro, Catalyst, 5, "Sumeru"),
    ("Navia", Geo, Claymore, 5, "Fontaine"),
    ("Raiden Shogun", Electro, Polearm, 5, "Inazuma"),
    ("Sucrose", Anemo, Catalyst, 4, "Mondstadt"),
    ("Xiangling", Pyro, Polearm, 4, "Liyue"),
    ("Xingqiu", Hydro, Sword, 4, "Liyue"),
    ("Yelan", Hydro, Bow, 5, "Liyue"),
    ("Zhongli", Geo, Polearm, 5, "Liyue"),
];

/// Insert the catalog into `tables`, returning how many characters were added.
pub(super) fn seed_catalog(tables: &mut Tables) -> usize {
    for &(name, element, weapon_type, rarity, region) in CATALOG {
        let id = next_id(&mut tables.sequences.characters);
        tables.characters.insert(
            id,
            Character {
                id,
                name: name.to_string(),
                element,
                weapon_type,
                rarity,
                region: region.to_string(),
                icon_url: None,
                description: None,
            },
        );
    }
    CATALOG.len()
}
