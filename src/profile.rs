// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::db::Database;
use crate::error::Fallible;

const TRAINEE_KEY: &str = "tajweed_trainee_name";

/// The display name printed on reports. Blank names read as absent.
pub fn trainee_name(db: &Database) -> Fallible<Option<String>> {
    let name = db.get(TRAINEE_KEY)?;
    Ok(name.filter(|name| !name.trim().is_empty()))
}

pub fn set_trainee_name(db: &Database, name: &str) -> Fallible<()> {
    let name = name.trim();
    if name.is_empty() {
        db.remove(TRAINEE_KEY)?;
    } else {
        db.put(TRAINEE_KEY, name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainee_name() -> Fallible<()> {
        let db = Database::in_memory()?;
        assert_eq!(trainee_name(&db)?, None);
        set_trainee_name(&db, "  Yusuf ")?;
        assert_eq!(trainee_name(&db)?, Some("Yusuf".to_string()));
        set_trainee_name(&db, "")?;
        assert_eq!(trainee_name(&db)?, None);
        Ok(())
    }
}
