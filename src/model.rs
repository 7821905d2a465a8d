use serde::{Deserialize, Serialize};

pub type ItemId = String;
pub type InstanceId = String;
pub type UserId = String;

/// Collectable kinds tracked by the catalog. Each kind is a capability
/// descriptor: it knows its route segment, its guest storage key, and the
/// page size its list view requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Minion,
    Mount,
    Orchestrion,
    Spell,
    Card,
    Emote,
    Hairstyle,
}

impl ItemKind {
    pub const ALL: [ItemKind; 7] = [
        ItemKind::Minion,
        ItemKind::Mount,
        ItemKind::Orchestrion,
        ItemKind::Spell,
        ItemKind::Card,
        ItemKind::Emote,
        ItemKind::Hairstyle,
    ];

    /// Storage token, also the singular wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Minion => "minion",
            ItemKind::Mount => "mount",
            ItemKind::Orchestrion => "orchestrion",
            ItemKind::Spell => "spell",
            ItemKind::Card => "card",
            ItemKind::Emote => "emote",
            ItemKind::Hairstyle => "hairstyle",
        }
    }

    /// Route segment and procedure prefix, e.g. `minions` in `minions.getAll`.
    pub fn plural(&self) -> &'static str {
        match self {
            ItemKind::Minion => "minions",
            ItemKind::Mount => "mounts",
            ItemKind::Orchestrion => "orchestrions",
            ItemKind::Spell => "spells",
            ItemKind::Card => "cards",
            ItemKind::Emote => "emotes",
            ItemKind::Hairstyle => "hairstyles",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ItemKind::Minion => "Minion",
            ItemKind::Mount => "Mount",
            ItemKind::Orchestrion => "Orchestrion Roll",
            ItemKind::Spell => "Blue Magic Spell",
            ItemKind::Card => "Card",
            ItemKind::Emote => "Emote",
            ItemKind::Hairstyle => "Hairstyle",
        }
    }

    pub fn display_plural(&self) -> &'static str {
        match self {
            ItemKind::Minion => "Minions",
            ItemKind::Mount => "Mounts",
            ItemKind::Orchestrion => "Orchestrion Rolls",
            ItemKind::Spell => "Blue Magic Spells",
            ItemKind::Card => "Cards",
            ItemKind::Emote => "Emotes",
            ItemKind::Hairstyle => "Hairstyles",
        }
    }

    /// Key under which a guest collection of this kind is stored locally.
    pub fn storage_key(&self) -> String {
        format!("dungeoneer_{}", self.plural())
    }

    /// Page size the stock list view asks for.
    pub fn default_limit(&self) -> u32 {
        match self {
            ItemKind::Minion => 30,
            ItemKind::Mount => 10,
            _ => 20,
        }
    }

    pub fn from_plural(segment: &str) -> Option<ItemKind> {
        ItemKind::ALL.into_iter().find(|kind| kind.plural() == segment)
    }

    pub fn from_token(token: &str) -> Option<ItemKind> {
        ItemKind::ALL.into_iter().find(|kind| kind.as_str() == token)
    }
}

/// Duty kinds whose records embed the collectables they reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceKind {
    Dungeon,
    Trial,
    Raid,
    #[serde(rename = "variant")]
    VariantDungeon,
}

impl InstanceKind {
    pub const ALL: [InstanceKind; 4] = [
        InstanceKind::Dungeon,
        InstanceKind::Trial,
        InstanceKind::Raid,
        InstanceKind::VariantDungeon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceKind::Dungeon => "dungeon",
            InstanceKind::Trial => "trial",
            InstanceKind::Raid => "raid",
            InstanceKind::VariantDungeon => "variant",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            InstanceKind::Dungeon => "dungeons",
            InstanceKind::Trial => "trials",
            InstanceKind::Raid => "raids",
            InstanceKind::VariantDungeon => "variants",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InstanceKind::Dungeon => "Dungeon",
            InstanceKind::Trial => "Trial",
            InstanceKind::Raid => "Raid",
            InstanceKind::VariantDungeon => "Variant Dungeon",
        }
    }

    pub fn display_plural(&self) -> &'static str {
        match self {
            InstanceKind::Dungeon => "Dungeons",
            InstanceKind::Trial => "Trials",
            InstanceKind::Raid => "Raids",
            InstanceKind::VariantDungeon => "Variant Dungeons",
        }
    }

    pub fn default_limit(&self) -> u32 {
        match self {
            InstanceKind::Trial => 20,
            _ => 10,
        }
    }

    pub fn from_plural(segment: &str) -> Option<InstanceKind> {
        InstanceKind::ALL
            .into_iter()
            .find(|kind| kind.plural() == segment)
    }

    pub fn from_token(token: &str) -> Option<InstanceKind> {
        InstanceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
    }
}

/// Either side of the catalog, resolved from a route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyKind {
    Item(ItemKind),
    Instance(InstanceKind),
}

impl AnyKind {
    pub fn from_plural(segment: &str) -> Option<AnyKind> {
        if let Some(kind) = ItemKind::from_plural(segment) {
            return Some(AnyKind::Item(kind));
        }
        InstanceKind::from_plural(segment).map(AnyKind::Instance)
    }

    pub fn plural(&self) -> &'static str {
        match self {
            AnyKind::Item(kind) => kind.plural(),
            AnyKind::Instance(kind) => kind.plural(),
        }
    }

    pub fn display_plural(&self) -> &'static str {
        match self {
            AnyKind::Item(kind) => kind.display_plural(),
            AnyKind::Instance(kind) => kind.display_plural(),
        }
    }

    pub fn default_limit(&self) -> u32 {
        match self {
            AnyKind::Item(kind) => kind.default_limit(),
            AnyKind::Instance(kind) => kind.default_limit(),
        }
    }
}

/// One acquisition route for an item, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// An item record expanded with its sources and current owner list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedItem {
    pub id: ItemId,
    pub name: String,
    pub image: Option<String>,
    pub sources: Vec<Source>,
    pub owners: Vec<UserId>,
}

impl ExpandedItem {
    pub fn owned_by(&self, user: &str) -> bool {
        self.owners.iter().any(|owner| owner == user)
    }
}

/// Compact item record returned from ownership mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
}

/// An instance record with every collectable it rewards, grouped by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedInstance {
    pub id: InstanceId,
    pub name: String,
    pub image: Option<String>,
    pub minions: Vec<ExpandedItem>,
    pub mounts: Vec<ExpandedItem>,
    pub orchestrions: Vec<ExpandedItem>,
    pub spells: Vec<ExpandedItem>,
    pub cards: Vec<ExpandedItem>,
    pub emotes: Vec<ExpandedItem>,
    pub hairstyles: Vec<ExpandedItem>,
}

impl ExpandedInstance {
    pub fn empty(id: InstanceId, name: String, image: Option<String>) -> Self {
        ExpandedInstance {
            id,
            name,
            image,
            minions: Vec::new(),
            mounts: Vec::new(),
            orchestrions: Vec::new(),
            spells: Vec::new(),
            cards: Vec::new(),
            emotes: Vec::new(),
            hairstyles: Vec::new(),
        }
    }

    pub fn items_of(&self, kind: ItemKind) -> &[ExpandedItem] {
        match kind {
            ItemKind::Minion => &self.minions,
            ItemKind::Mount => &self.mounts,
            ItemKind::Orchestrion => &self.orchestrions,
            ItemKind::Spell => &self.spells,
            ItemKind::Card => &self.cards,
            ItemKind::Emote => &self.emotes,
            ItemKind::Hairstyle => &self.hairstyles,
        }
    }

    pub(crate) fn items_of_mut(&mut self, kind: ItemKind) -> &mut Vec<ExpandedItem> {
        match kind {
            ItemKind::Minion => &mut self.minions,
            ItemKind::Mount => &mut self.mounts,
            ItemKind::Orchestrion => &mut self.orchestrions,
            ItemKind::Spell => &mut self.spells,
            ItemKind::Card => &mut self.cards,
            ItemKind::Emote => &mut self.emotes,
            ItemKind::Hairstyle => &mut self.hairstyles,
        }
    }

    /// Iterates the reward groups in kind order, skipping empty ones.
    pub fn reward_groups(&self) -> impl Iterator<Item = (ItemKind, &[ExpandedItem])> {
        ItemKind::ALL
            .into_iter()
            .map(|kind| (kind, self.items_of(kind)))
            .filter(|(_, items)| !items.is_empty())
    }

    /// True when the user owns every reward this instance offers. An
    /// instance with no rewards counts as complete.
    pub fn fully_owned_by(&self, user: &str) -> bool {
        ItemKind::ALL
            .into_iter()
            .all(|kind| self.items_of(kind).iter().all(|item| item.owned_by(user)))
    }
}

/// One page of a catalog listing. `next_cursor` is absent on the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Page {
            items,
            next_cursor: None,
        }
    }
}
