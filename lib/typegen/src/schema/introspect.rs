//! Live schema introspection over HTTP.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::error::SchemaLoadError;
use super::introspection::IntrospectionResponse;

#[derive(Serialize)]
struct IntrospectionRequest {
    query: String,
}

/// Builds the standard introspection query. Deprecated fields and enum values
/// are excluded unless asked for, mirroring what servers do by default.
pub fn introspection_query(include_deprecated_fields: bool, include_deprecated_enum_values: bool) -> String {
    format!(
        r#"query IntrospectionQuery {{
  __schema {{
    queryType {{ name }}
    mutationType {{ name }}
    subscriptionType {{ name }}
    types {{
      kind
      name
      description
      fields(includeDeprecated: {fields}) {{
        name
        description
        args {{ ...InputValue }}
        type {{ ...TypeRef }}
        isDeprecated
        deprecationReason
      }}
      inputFields {{ ...InputValue }}
      interfaces {{ name }}
      enumValues(includeDeprecated: {enum_values}) {{
        name
        description
        isDeprecated
        deprecationReason
      }}
      possibleTypes {{ name }}
    }}
  }}
}}
fragment InputValue on __InputValue {{
  name
  description
  type {{ ...TypeRef }}
  defaultValue
}}
fragment TypeRef on __Type {{
  kind
  name
  ofType {{
    kind
    name
    ofType {{
      kind
      name
      ofType {{
        kind
        name
        ofType {{
          kind
          name
          ofType {{
            kind
            name
            ofType {{
              kind
              name
              ofType {{ kind name }}
            }}
          }}
        }}
      }}
    }}
  }}
}}"#,
        fields = include_deprecated_fields,
        enum_values = include_deprecated_enum_values,
    )
}

/// Runs the introspection query against an endpoint and returns the raw
/// response body alongside the decoded result.
pub async fn run_introspection(
    endpoint: &str,
    include_deprecated_fields: bool,
    include_deprecated_enum_values: bool,
) -> Result<IntrospectionResponse, SchemaLoadError> {
    debug!(endpoint, "fetching schema via introspection");
    let client = reqwest::Client::new();
    let body: Value = client
        .post(endpoint)
        .json(&IntrospectionRequest {
            query: introspection_query(include_deprecated_fields, include_deprecated_enum_values),
        })
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(errors) = body.get("errors") {
        if errors.as_array().is_some_and(|e| !e.is_empty()) {
            return Err(SchemaLoadError::IntrospectionErrors(errors.to_string()));
        }
    }
    Ok(serde_json::from_value(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deprecation_flags_are_spliced_into_the_query() {
        let query = introspection_query(true, false);
        assert!(query.contains("fields(includeDeprecated: true)"));
        assert!(query.contains("enumValues(includeDeprecated: false)"));
    }
}
