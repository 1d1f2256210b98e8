use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub(crate) fn is_left(self) -> bool {
        self == Facing::Left
    }
}
