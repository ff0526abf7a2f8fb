//! One converter per unit category
//!
//! Each converter only contributes its category guidance and the code fields
//! it expects back; prompting and parsing are shared.

use super::json::ParseError;
use super::prompt;
use super::response::{parse_response, CodeField, Conversion};
use super::{ConversionContext, Converter};
use crate::scanner::UnitCategory;

pub struct EntityConverter;

const ENTITY_FIELDS: &[CodeField] = &[CodeField::required("code", "")];

impl Converter for EntityConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Entity
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file was classified as a persistent data record (JPA entity, \
             embeddable or document). Produce a plain domain struct with field tags \
             for the persistence layer and JSON. Keep column names, keep nullability \
             explicit, and map relationships to identifier fields. If the class is \
             not actually persisted (a DTO, a projection, an enum of constants), set \
             \"skip\" to true and explain why in \"skip_reason\".",
            ENTITY_FIELDS,
            true,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, ENTITY_FIELDS, true)
    }
}

pub struct RepositoryConverter;

const REPOSITORY_FIELDS: &[CodeField] = &[
    CodeField::required("code", ""),
    CodeField::optional("implementation_code", "_impl"),
];

impl Converter for RepositoryConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Repository
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file is a data-access repository. Put the repository interface in \
             \"code\" and a SQL implementation in \"implementation_code\". Derived query \
             methods (findByEmailAndStatus and similar) must become explicit queries. \
             Every method takes a context as its first parameter and returns an error.",
            REPOSITORY_FIELDS,
            false,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, REPOSITORY_FIELDS, false)
    }
}

pub struct ServiceConverter;

const SERVICE_FIELDS: &[CodeField] = &[CodeField::required("code", "")];

impl Converter for ServiceConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Service
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file holds business logic. Produce a service struct whose \
             dependencies are passed to a constructor function instead of injected. \
             Transactional boundaries must be explicit; flag any @Transactional \
             propagation or isolation settings for review.",
            SERVICE_FIELDS,
            false,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, SERVICE_FIELDS, false)
    }
}

pub struct ControllerConverter;

const CONTROLLER_FIELDS: &[CodeField] = &[
    CodeField::required("code", ""),
    CodeField::optional("routes_code", "_routes"),
];

impl Converter for ControllerConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Controller
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file is an HTTP boundary. Produce handler functions in \"code\" and \
             route registration in \"routes_code\". Preserve paths, methods, status \
             codes and request validation. Security annotations must be flagged for review.",
            CONTROLLER_FIELDS,
            false,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, CONTROLLER_FIELDS, false)
    }
}

pub struct JobConverter;

const JOB_FIELDS: &[CodeField] = &[CodeField::required("code", "")];

impl Converter for JobConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Job
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file contains scheduled tasks. Produce a job type with a Run method \
             per scheduled method and keep the schedule (cron expression or fixed \
             rate/delay) as a constant next to it. Jobs must stop when their context \
             is cancelled.",
            JOB_FIELDS,
            false,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, JOB_FIELDS, false)
    }
}

pub struct ListenerConverter;

const LISTENER_FIELDS: &[CodeField] = &[CodeField::required("code", "")];

impl Converter for ListenerConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Listener
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file consumes messages or application events. Produce a handler \
             type with one method per listener that receives the decoded payload. \
             Keep topic/queue names as constants. Acknowledgement and retry semantics \
             must be described in notes and flagged for review when non-default.",
            LISTENER_FIELDS,
            false,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, LISTENER_FIELDS, false)
    }
}

pub struct ConfigurationConverter;

const CONFIGURATION_FIELDS: &[CodeField] = &[CodeField::required("code", "")];

impl Converter for ConfigurationConverter {
    fn category(&self) -> UnitCategory {
        UnitCategory::Configuration
    }

    fn system_prompt(&self, ctx: &ConversionContext) -> String {
        prompt::system_prompt(
            ctx,
            "This file wires the application together or binds configuration \
             properties. Produce a config struct loaded from environment variables \
             with defaults, plus constructor functions for any beans it declares. \
             Drop framework-only wiring and list what was dropped in notes.",
            CONFIGURATION_FIELDS,
            false,
        )
    }

    fn parse(&self, content: &str) -> Result<Conversion, ParseError> {
        parse_response(content, CONFIGURATION_FIELDS, false)
    }
}

pub fn converter_for(category: UnitCategory) -> Box<dyn Converter> {
    match category {
        UnitCategory::Entity => Box::new(EntityConverter),
        UnitCategory::Repository => Box::new(RepositoryConverter),
        UnitCategory::Service => Box::new(ServiceConverter),
        UnitCategory::Controller => Box::new(ControllerConverter),
        UnitCategory::Job => Box::new(JobConverter),
        UnitCategory::Listener => Box::new(ListenerConverter),
        UnitCategory::Configuration => Box::new(ConfigurationConverter),
    }
}
