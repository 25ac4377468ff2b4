/// Error describes a (nested) server error.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Error {
    /// Id is unique for a specific error, e.g. mydomain.not.assigned
    #[serde(rename = "id")]
    pub Id: ::std::string::String,
    /// Message is a string for the developer
    #[serde(rename = "message")]
    pub Message: ::std::string::String,
    /// LocalizedMessage is something to display the user
    #[serde(rename = "localizedMessage", skip_serializing_if = "::std::string::String::is_empty")]
    pub LocalizedMessage: ::std::string::String,
    /// CausedBy returns an optional root error
    #[serde(rename = "causedBy", skip_serializing_if = "::std::option::Option::is_none")]
    pub CausedBy: ::std::option::Option<::std::boxed::Box<Error>>,
    /// Type is a developer notice for the internal inspection
    #[serde(rename = "type", skip_serializing_if = "::std::string::String::is_empty")]
    pub Type: ::std::string::String,
    /// Details contains arbitrary payload
    #[serde(rename = "details", skip_serializing_if = "serde_json::Value::is_null")]
    pub Details: serde_json::Value,
}

/// ParseError tries to parse the body as json. In any case it returns an error.
///
/// A body which cannot be decoded is kept as a string in `Details`.
pub fn ParseError(mut reader: impl io::Read) -> Error {
    let mut buf = ::std::vec::Vec::new();
    if let Err(err) = io::Read::read_to_end(&mut reader, &mut buf) {
        return AsError(&err);
    }

    match serde_json::from_slice::<Error>(&buf) {
        Ok(res) => res,
        Err(err) => {
            let mut res = AsError(&err);
            res.Details = serde_json::Value::String(::std::string::String::from_utf8_lossy(&buf).into_owned());
            res
        }
    }
}

impl Error {
    /// ID returns the unique error class id
    pub fn ID(&self) -> &str {
        &self.Id
    }

    /// Error returns the message
    pub fn Error(&self) -> &str {
        &self.Message
    }

    /// LocalizedError is like Error but translated or empty
    pub fn LocalizedError(&self) -> &str {
        &self.LocalizedMessage
    }

    /// Class returns the technical type
    pub fn Class(&self) -> &str {
        &self.Type
    }

    /// Payload returns the details
    pub fn Payload(&self) -> &serde_json::Value {
        &self.Details
    }

    /// Unwrap returns the cause, if any
    pub fn Unwrap(&self) -> ::std::option::Option<&Error> {
        self.CausedBy.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.Message)
    }
}

impl error::Error for Error {
    fn source(&self) -> ::std::option::Option<&(dyn error::Error + 'static)> {
        self.CausedBy
            .as_deref()
            .map(|cause| cause as &(dyn error::Error + 'static))
    }
}

/// AsError converts any error into a server error. A server error is returned as is.
pub fn AsError<E: error::Error + 'static>(err: &E) -> Error {
    asErrorNamed(err, any::type_name::<E>())
}

fn asErrorNamed(err: &(dyn error::Error + 'static), class: &str) -> Error {
    if let Some(err) = err.downcast_ref::<Error>() {
        return err.clone();
    }

    Error {
        Id: class.to_string(),
        Message: err.to_string(),
        LocalizedMessage: ::std::string::String::new(),
        CausedBy: err
            .source()
            .map(|cause| ::std::boxed::Box::new(asErrorNamed(cause, "dyn std::error::Error"))),
        Type: class.to_string(),
        Details: serde_json::Value::Null,
    }
}
