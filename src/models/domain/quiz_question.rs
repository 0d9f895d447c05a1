use serde::{
    de::{self, DeserializeOwned},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};

/// A question inside a quiz, keyed on its `type`. Only multiple choice questions are
/// auto-scored; any other type is kept as authored and scores nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum QuizQuestion {
    MultipleChoice {
        id: String,
        question: Option<String>,
        options: Vec<Value>,
        answer: Option<Value>,
        points: f64,
    },
    Essay {
        id: String,
        question: Option<String>,
        points: f64,
    },
    /// A type this server does not grade. Fields beyond the common ones ride along in `extra`.
    Unscored {
        id: String,
        kind: String,
        question: Option<String>,
        points: f64,
        extra: Map<String, Value>,
    },
}

impl QuizQuestion {
    pub fn id(&self) -> &str {
        match self {
            QuizQuestion::MultipleChoice { id, .. }
            | QuizQuestion::Essay { id, .. }
            | QuizQuestion::Unscored { id, .. } => id,
        }
    }

    /// The authored `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            QuizQuestion::MultipleChoice { .. } => "mcq",
            QuizQuestion::Essay { .. } => "essay",
            QuizQuestion::Unscored { kind, .. } => kind,
        }
    }

    /// Points this question awards when answered correctly, truncated to a whole number.
    pub fn whole_points(&self) -> i32 {
        let points = match self {
            QuizQuestion::MultipleChoice { points, .. }
            | QuizQuestion::Essay { points, .. }
            | QuizQuestion::Unscored { points, .. } => *points,
        };
        points.trunc() as i32
    }
}

/// Question ids arrive as either strings or integers; both are keyed as strings.
pub fn question_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Removes `name` from `fields`; a missing key or null gives the default.
fn take_field<T, E>(fields: &mut Map<String, Value>, name: &str) -> Result<T, E>
where
    T: DeserializeOwned + Default,
    E: de::Error,
{
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| E::custom(format!("invalid `{}`: {}", name, e))),
    }
}

impl<'de> Deserialize<'de> for QuizQuestion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) if !kind.trim().is_empty() => kind,
            _ => return Err(de::Error::custom("question type must be a non-empty string")),
        };
        let id = fields
            .remove("id")
            .as_ref()
            .and_then(question_id_from_value)
            .ok_or_else(|| de::Error::custom("question id must be a non-empty string or number"))?;
        let question: Option<String> = take_field(&mut fields, "question")?;
        let points: f64 = take_field(&mut fields, "points")?;

        Ok(match kind.as_str() {
            "mcq" => QuizQuestion::MultipleChoice {
                id,
                question,
                options: take_field(&mut fields, "options")?,
                answer: fields.remove("answer").filter(|v| !v.is_null()),
                points,
            },
            "essay" => QuizQuestion::Essay {
                id,
                question,
                points,
            },
            _ => QuizQuestion::Unscored {
                id,
                kind,
                question,
                points,
                extra: fields,
            },
        })
    }
}

impl Serialize for QuizQuestion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind())?;
        match self {
            QuizQuestion::MultipleChoice {
                id,
                question,
                options,
                answer,
                points,
            } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("question", question)?;
                map.serialize_entry("options", options)?;
                map.serialize_entry("answer", answer)?;
                map.serialize_entry("points", points)?;
            }
            QuizQuestion::Essay {
                id,
                question,
                points,
            } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("question", question)?;
                map.serialize_entry("points", points)?;
            }
            QuizQuestion::Unscored {
                id,
                question,
                points,
                extra,
                ..
            } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("question", question)?;
                map.serialize_entry("points", points)?;
                for (key, value) in extra {
                    map.serialize_entry(key, value)?;
                }
            }
        }
        map.end()
    }
}
