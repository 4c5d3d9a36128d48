//! Test fixtures for Kanon development and testing.
//!
//! Pre-built documents used by tests across the workspace.
//!
//! # Example
//!
//! ```
//! use kanon_core::fixtures;
//! use http::Method;
//!
//! let document = fixtures::foo_document();
//! assert!(document.operation(&Method::POST, "/foo/{bar}").is_some());
//! ```

use http::Method;

use crate::document::{Document, Header, Operation, Parameter, RequestBody, Response, StatusKey};
use crate::schema::{Format, Schema};

/// The `/foo/{bar}` example as a legacy YAML document.
///
/// `POST /foo/{bar}` takes a numeric path parameter, a required `email`
/// query parameter `baz` and a JSON body requiring the boolean `john`. A 200
/// response must be an object with an integer `status` and nothing else.
pub const FOO_SWAGGER_YAML: &str = r#"swagger: "2.0"
info:
  version: 1.0.0
  title: testing
schemes:
- "http"

paths:
  /foo/{bar}:
    post:
      summary: Example
      produces:
        - application/json
      parameters:
        - name: bar
          in: path
          type: number
          required: true
          description: example path parameter
        - name: baz
          in: query
          type: string
          format: email
          required: true
          description: example query parameter
        - name: body
          in: body
          schema:
            type: object
            required:
              - john
            properties:
              john:
                type: boolean
              betty:
                type: string
          required: true
          description: example body parameter
      responses:
        200:
          description: response
          schema:
            type: object
            required:
              - status
            additionalProperties: false
            properties:
              status:
                type: integer
              weight:
                type: number
        400:
          description: error
          produces:
            - text/plain
"#;

/// The `/foo/{bar}` example assembled with builders.
///
/// Equivalent to converting [`FOO_SWAGGER_YAML`].
#[must_use]
pub fn foo_document() -> Document {
    Document::builder("testing")
        .version("1.0.0")
        .operation(
            Operation::builder(Method::POST, "/foo/{bar}")
                .summary("Example")
                .parameter(Parameter::path("bar", Schema::number()))
                .parameter(
                    Parameter::query("baz", Schema::string().format(Format::Email)).required(),
                )
                .request_body(
                    RequestBody::json(
                        Schema::object()
                            .property("john", Schema::boolean())
                            .property("betty", Schema::string())
                            .require("john"),
                    )
                    .required(),
                )
                .response(StatusKey::Code(200), Response::new("response").json(foo_status_schema()))
                .response(StatusKey::Code(400), Response::new("error"))
                .build(),
        )
        .build()
}

/// Response schema of `POST /foo/{bar}`.
#[must_use]
pub fn foo_status_schema() -> Schema {
    Schema::object()
        .property("status", Schema::integer())
        .property("weight", Schema::number())
        .require("status")
        .forbid_additional()
}

/// A pet store with references, overlapping templates and headers.
///
/// Operations:
/// - `listPets` - GET /pets (query `limit`, `tags`)
/// - `createPet` - POST /pets
/// - `getPet` - GET /pets/{petId}
/// - `deletePet` - DELETE /pets/{petId}
/// - `getMine` - GET /pets/mine
#[must_use]
pub fn pet_store_document() -> Document {
    Document::builder("pet-store")
        .version("2.0.0")
        .server("https://pets.example.com/v2")
        .schema("Pet", pet_schema())
        .schema(
            "NewPet",
            Schema::object()
                .property("name", Schema::string().min_length(1).max_length(32))
                .property("tag", Schema::string().nullable())
                .require("name"),
        )
        .operation(
            Operation::builder(Method::GET, "/pets")
                .operation_id("listPets")
                .parameter(Parameter::query("limit", Schema::integer().minimum(1.0).maximum(100.0)))
                .parameter(Parameter::query("tags", Schema::array(Schema::string())))
                .response(
                    StatusKey::Code(200),
                    Response::new("pets")
                        .json(Schema::array(Schema::reference("Pet")))
                        .header("X-Total", Header::new(Schema::integer()).required()),
                )
                .build(),
        )
        .operation(
            Operation::builder(Method::POST, "/pets")
                .operation_id("createPet")
                .request_body(RequestBody::json(Schema::reference("NewPet")).required())
                .response(StatusKey::Code(201), Response::new("created").json(Schema::reference("Pet")))
                .response(StatusKey::Default, Response::new("error").json(error_schema()))
                .build(),
        )
        .operation(
            Operation::builder(Method::GET, "/pets/{petId}")
                .operation_id("getPet")
                .parameter(Parameter::path("petId", Schema::integer().format(Format::Int64)))
                .response(StatusKey::Code(200), Response::new("pet").json(Schema::reference("Pet")))
                .response(StatusKey::Range(4), Response::new("client error").json(error_schema()))
                .build(),
        )
        .operation(
            Operation::builder(Method::DELETE, "/pets/{petId}")
                .operation_id("deletePet")
                .parameter(Parameter::path("petId", Schema::integer()))
                .parameter(Parameter::header("X-Request-Id", Schema::string().format(Format::Uuid)).required())
                .response(StatusKey::Code(204), Response::new("deleted"))
                .build(),
        )
        .operation(
            Operation::builder(Method::GET, "/pets/mine")
                .operation_id("getMine")
                .parameter(Parameter::cookie("session", Schema::string().min_length(8)).required())
                .response(StatusKey::Code(200), Response::new("mine").json(Schema::array(Schema::reference("Pet"))))
                .build(),
        )
        .build()
}

/// The `Pet` component.
#[must_use]
pub fn pet_schema() -> Schema {
    Schema::object()
        .property("id", Schema::integer().format(Format::Int64))
        .property("name", Schema::string())
        .property(
            "status",
            Schema::string().enumeration([
                serde_json::json!("available"),
                serde_json::json!("sold"),
            ]),
        )
        .require("id")
        .require("name")
}

fn error_schema() -> Schema {
    Schema::object()
        .property("code", Schema::integer().format(Format::Int32))
        .property("message", Schema::string())
        .require("code")
}
