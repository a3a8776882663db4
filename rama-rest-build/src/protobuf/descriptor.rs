//! A narrow mirror of `google/protobuf/descriptor.proto`.
//!
//! `prost-types` drops unknown fields when decoding, which includes every
//! extension set on `MethodOptions`. The mirror only declares the fields
//! needed to recover the `rama.rest.http` method option (extension field
//! 50001) and decodes the same encoded descriptor set.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::{Error, HttpBinding, HttpVerb, Result};

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct FileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    pub(crate) file: Vec<FileDescriptorProto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct FileDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub(crate) name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub(crate) package: Option<String>,
    #[prost(message, repeated, tag = "6")]
    pub(crate) service: Vec<ServiceDescriptorProto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct ServiceDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub(crate) name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub(crate) method: Vec<MethodDescriptorProto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct MethodDescriptorProto {
    #[prost(string, optional, tag = "1")]
    pub(crate) name: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub(crate) options: Option<MethodOptions>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct MethodOptions {
    #[prost(message, repeated, tag = "50001")]
    pub(crate) http: Vec<Http>,
}

/// `rama.rest.Http`
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Http {
    #[prost(oneof = "http::Pattern", tags = "1, 2, 3, 4, 5, 6")]
    pub(crate) pattern: Option<http::Pattern>,
}

pub(crate) mod http {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub(crate) enum Pattern {
        #[prost(string, tag = "1")]
        Get(String),
        #[prost(string, tag = "2")]
        Put(String),
        #[prost(string, tag = "3")]
        Post(String),
        #[prost(string, tag = "4")]
        Delete(String),
        #[prost(string, tag = "5")]
        Patch(String),
        #[prost(string, tag = "6")]
        Head(String),
    }
}

impl From<http::Pattern> for HttpBinding {
    fn from(pattern: http::Pattern) -> Self {
        match pattern {
            http::Pattern::Get(path) => Self::new(HttpVerb::Get, path),
            http::Pattern::Put(path) => Self::new(HttpVerb::Put, path),
            http::Pattern::Post(path) => Self::new(HttpVerb::Post, path),
            http::Pattern::Delete(path) => Self::new(HttpVerb::Delete, path),
            http::Pattern::Patch(path) => Self::new(HttpVerb::Patch, path),
            http::Pattern::Head(path) => Self::new(HttpVerb::Head, path),
        }
    }
}

/// `(package, service, method)` as declared in the `.proto` files.
pub(crate) type MethodKey = (String, String, String);

/// HTTP bindings of every method of a descriptor set.
#[derive(Debug, Default)]
pub(crate) struct HttpAnnotations {
    methods: HashMap<MethodKey, Vec<HttpBinding>>,
}

impl HttpAnnotations {
    /// Decode an encoded `FileDescriptorSet` and collect its `http` options.
    ///
    /// Fails on an option without a verb pattern and on duplicate
    /// service or method names.
    pub(crate) fn decode(encoded: &[u8]) -> Result<Self> {
        let fds = <FileDescriptorSet as prost::Message>::decode(encoded)?;
        Self::collect(&fds)
    }

    pub(crate) fn collect(fds: &FileDescriptorSet) -> Result<Self> {
        let mut methods = HashMap::new();
        let mut services = HashSet::new();

        for file in &fds.file {
            let package = file.package.clone().unwrap_or_default();
            trace!(
                "collecting http options of {}",
                file.name.as_deref().unwrap_or("<unnamed>")
            );
            for service in &file.service {
                let service_name = service.name.clone().unwrap_or_default();
                if !services.insert((package.clone(), service_name.clone())) {
                    return Err(Error::DuplicateService {
                        package,
                        service: service_name,
                    });
                }

                for method in &service.method {
                    let method_name = method.name.clone().unwrap_or_default();
                    let key = (package.clone(), service_name.clone(), method_name.clone());
                    if methods.contains_key(&key) {
                        return Err(Error::DuplicateMethod {
                            service: service_name,
                            method: method_name,
                        });
                    }

                    let rules = method
                        .options
                        .as_ref()
                        .map(|options| options.http.as_slice())
                        .unwrap_or_default();
                    let mut bindings = Vec::with_capacity(rules.len());
                    for (index, rule) in rules.iter().enumerate() {
                        let Some(pattern) = rule.pattern.clone() else {
                            return Err(Error::MissingHttpPattern {
                                service: service_name,
                                method: method_name,
                                index,
                            });
                        };
                        let binding = HttpBinding::from(pattern);
                        trace!(
                            "{package}.{service_name}.{method_name}: http {} {}",
                            binding.verb(),
                            binding.path()
                        );
                        bindings.push(binding);
                    }
                    methods.insert(key, bindings);
                }
            }
        }

        Ok(Self { methods })
    }

    /// Bindings of a method, in declaration order.
    pub(crate) fn bindings(&self, package: &str, service: &str, method: &str) -> Vec<HttpBinding> {
        self.methods
            .get(&(package.to_owned(), service.to_owned(), method.to_owned()))
            .cloned()
            .unwrap_or_default()
    }
}
