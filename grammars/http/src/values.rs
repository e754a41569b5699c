//! Structured header values.
//!
//! Most structured values share one shape: a token, optionally `/` and a
//! second token, optionally a parameter list. [`ElementParser`] reads that
//! shape and each value type picks out the parts it defines. Comma lists
//! of elements go through [`ListParser`].

use std::sync::{Arc, OnceLock};

use pullkit_core::{Diagnostic, HashGenCacheMap, Input, Parsed, Parser, resume};

use crate::error::HttpError;
use crate::grammar::{CommentParser, TokenParser, is_space, skip_space, write_comment, write_token};
use crate::params::{ParamMode, Params, ParamsParser, Weight};

static CODINGS: OnceLock<HashGenCacheMap<String, str>> = OnceLock::new();
static MEDIA_TYPES: OnceLock<HashGenCacheMap<String, MediaType>> = OnceLock::new();

/// The shared lowercase copy of a content or transfer coding name.
pub fn intern_coding(name: &str) -> Arc<str> {
    let codings = CODINGS.get_or_init(|| HashGenCacheMap::new(64));
    let key = name.to_ascii_lowercase();
    match codings.get(&key) {
        Some(cached) => cached,
        None => {
            let value = Arc::<str>::from(key.as_str());
            codings.put(key, value)
        }
    }
}

/// The shared copy of a parameterless media type.
///
/// Media types with parameters are not shared.
pub fn intern_media_type(media_type: MediaType) -> Arc<MediaType> {
    if !media_type.params.is_empty() {
        return Arc::new(media_type);
    }
    let types = MEDIA_TYPES.get_or_init(|| HashGenCacheMap::new(128));
    let key = format!("{}/{}", media_type.kind, media_type.subtype).to_ascii_lowercase();
    match types.get(&key) {
        Some(cached) => cached,
        None => types.put(key, media_type),
    }
}

/// Where a `/` may follow the leading token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slash {
    Never,
    Optional,
    Required,
}

/// `name [ "/" sub ] [ params ]`, as read by [`ElementParser`].
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) sub: Option<String>,
    pub(crate) params: Params,
}

enum Step {
    Name(TokenParser),
    Slash(String),
    Sub(String, TokenParser),
    Params(String, Option<String>, ParamsParser),
}

pub(crate) struct ElementParser {
    slash: Slash,
    params: Option<ParamMode>,
    step: Step,
}

impl ElementParser {
    pub(crate) fn new(slash: Slash, params: Option<ParamMode>) -> Self {
        Self {
            slash,
            params,
            step: Step::Name(TokenParser::new()),
        }
    }

    /// A bare token, as in `Connection`.
    pub(crate) fn token() -> Self {
        Self::new(Slash::Never, None)
    }
}

impl Parser for ElementParser {
    type Value = Element;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Element> {
        let ElementParser {
            slash,
            params,
            mut step,
        } = self;
        loop {
            step = match step {
                Step::Name(parser) => {
                    let name = resume!(parser.feed(input), |parser| ElementParser {
                        slash,
                        params,
                        step: Step::Name(parser),
                    });
                    Step::Slash(name)
                }
                Step::Slash(name) => match input.head() {
                    Some('/') if slash != Slash::Never => {
                        input.step();
                        Step::Sub(name, TokenParser::new())
                    }
                    None if input.is_empty() && slash != Slash::Never => {
                        return Parsed::Cont(ElementParser {
                            slash,
                            params,
                            step: Step::Slash(name),
                        });
                    }
                    _ if slash == Slash::Required => {
                        return Parsed::Error(Diagnostic::expected_char('/', input));
                    }
                    _ => match params {
                        Some(mode) => Step::Params(name, None, ParamsParser::new(mode)),
                        None => {
                            return Parsed::Done(Element {
                                name,
                                sub: None,
                                params: Params::new(),
                            });
                        }
                    },
                },
                Step::Sub(name, parser) => {
                    let sub = resume!(parser.feed(input), |parser| ElementParser {
                        slash,
                        params,
                        step: Step::Sub(name, parser),
                    });
                    match params {
                        Some(mode) => Step::Params(name, Some(sub), ParamsParser::new(mode)),
                        None => {
                            return Parsed::Done(Element {
                                name,
                                sub: Some(sub),
                                params: Params::new(),
                            });
                        }
                    }
                }
                Step::Params(name, sub, parser) => {
                    let list = resume!(parser.feed(input), |parser| ElementParser {
                        slash,
                        params,
                        step: Step::Params(name, sub, parser),
                    });
                    return Parsed::Done(Element {
                        name,
                        sub,
                        params: list,
                    });
                }
            };
        }
    }
}

/// Whether a header value ends at the cursor.
pub(crate) fn at_value_end<I: Input + ?Sized>(input: &I) -> bool {
    input.head() == Some('\r') || input.is_done()
}

enum ListState<P> {
    Start,
    Element(P),
    After,
}

/// Reads `#element`: comma-separated elements, empty ones skipped.
pub(crate) struct ListParser<P: Parser> {
    make: fn() -> P,
    items: Vec<P::Value>,
    state: ListState<P>,
}

impl<P: Parser> ListParser<P> {
    pub(crate) fn new(make: fn() -> P) -> Self {
        Self {
            make,
            items: Vec::new(),
            state: ListState::Start,
        }
    }
}

impl<P: Parser> Parser for ListParser<P> {
    type Value = Vec<P::Value>;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Vec<P::Value>> {
        let ListParser {
            make,
            mut items,
            mut state,
        } = self;
        loop {
            state = match state {
                ListState::Start => {
                    if !skip_space(input) {
                        return Parsed::Cont(ListParser {
                            make,
                            items,
                            state: ListState::Start,
                        });
                    }
                    if input.head() == Some(',') {
                        input.step();
                        ListState::Start
                    } else if at_value_end(input) {
                        return Parsed::Done(items);
                    } else {
                        ListState::Element(make())
                    }
                }
                ListState::Element(parser) => {
                    let item = resume!(parser.feed(input), |parser| ListParser {
                        make,
                        items,
                        state: ListState::Element(parser),
                    });
                    items.push(item);
                    ListState::After
                }
                ListState::After => {
                    if !skip_space(input) {
                        return Parsed::Cont(ListParser {
                            make,
                            items,
                            state: ListState::After,
                        });
                    }
                    match input.head() {
                        Some(',') => {
                            input.step();
                            ListState::Start
                        }
                        _ if at_value_end(input) => return Parsed::Done(items),
                        _ => return Parsed::Error(Diagnostic::expected_char(',', input)),
                    }
                }
            };
        }
    }
}

/// Joins rendered list elements with `, `.
pub(crate) fn render_list<T>(
    line: &mut String,
    items: &[T],
    render: impl Fn(&T, &mut String) -> Result<(), HttpError>,
) -> Result<(), HttpError> {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            line.push_str(", ");
        }
        render(item, line)?;
    }
    Ok(())
}

/// A content coding with an optional weight, as in `Accept-Encoding`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentCoding {
    pub name: Arc<str>,
    pub weight: Option<Weight>,
}

impl ContentCoding {
    pub fn new(name: &str) -> Self {
        Self {
            name: intern_coding(name),
            weight: None,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Never, Some(ParamMode::Weighted))
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, &self.name)?;
        Params {
            list: Vec::new(),
            weight: self.weight,
        }
        .render(line)
    }
}

impl ContentCoding {
    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            name: intern_coding(&element.name),
            weight: element.params.weight,
        }
    }
}

/// A charset with an optional weight, as in `Accept-Charset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Charset {
    pub name: String,
    pub weight: Option<Weight>,
}

impl Charset {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            weight: None,
        }
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Never, Some(ParamMode::Weighted))
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, &self.name)?;
        Params {
            list: Vec::new(),
            weight: self.weight,
        }
        .render(line)
    }
}

impl Charset {
    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            name: element.name,
            weight: element.params.weight,
        }
    }
}

/// `type/subtype` with parameters, as in `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaType {
    pub kind: String,
    pub subtype: String,
    pub params: Params,
}

impl MediaType {
    pub fn new(kind: &str, subtype: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            subtype: subtype.to_owned(),
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params = self.params.with(name, value);
        self
    }

    /// Compares type and subtype, ignoring case and parameters.
    pub fn is(&self, kind: &str, subtype: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind) && self.subtype.eq_ignore_ascii_case(subtype)
    }

    pub fn charset(&self) -> Option<&str> {
        self.params.get("charset")
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Required, Some(ParamMode::Plain))
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, &self.kind)?;
        line.push('/');
        write_token(line, &self.subtype)?;
        self.params.render(line)
    }

    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            kind: element.name,
            subtype: element.sub.unwrap_or_default(),
            params: Params {
                list: element.params.list,
                weight: None,
            },
        }
    }
}

/// A weighted media range, as in `Accept`.
///
/// Parameters after `q` are kept with the media type's own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRange {
    pub media_type: Arc<MediaType>,
    pub weight: Option<Weight>,
}

impl MediaRange {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type: intern_media_type(media_type),
            weight: None,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Whether this range covers `media_type`.
    pub fn matches(&self, media_type: &MediaType) -> bool {
        let range = &self.media_type;
        (range.kind == "*" || range.kind.eq_ignore_ascii_case(&media_type.kind))
            && (range.subtype == "*" || range.subtype.eq_ignore_ascii_case(&media_type.subtype))
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Required, Some(ParamMode::Weighted))
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        self.media_type.render(line)?;
        Params {
            list: Vec::new(),
            weight: self.weight,
        }
        .render(line)
    }
}

impl MediaRange {
    pub(crate) fn from_element(element: Element) -> Self {
        let weight = element.params.weight;
        Self {
            media_type: intern_media_type(MediaType::from_element(element)),
            weight,
        }
    }
}

/// A transfer coding with parameters, as in `Transfer-Encoding`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferCoding {
    pub name: Arc<str>,
    pub params: Params,
}

impl TransferCoding {
    pub fn new(name: &str) -> Self {
        Self {
            name: intern_coding(name),
            params: Params::new(),
        }
    }

    pub fn chunked() -> Self {
        Self::new("chunked")
    }

    pub fn is_chunked(&self) -> bool {
        &*self.name == "chunked"
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Never, Some(ParamMode::Plain))
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, &self.name)?;
        self.params.render(line)
    }
}

impl TransferCoding {
    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            name: intern_coding(&element.name),
            params: element.params,
        }
    }
}

/// A weighted language range, as in `Accept-Language`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LanguageRange {
    pub tag: String,
    pub weight: Option<Weight>,
}

impl LanguageRange {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            weight: None,
        }
    }

    /// The primary language, before the first `-`.
    pub fn primary(&self) -> &str {
        self.tag.split('-').next().unwrap_or_default()
    }

    /// The subtags after the primary language.
    pub fn subtags(&self) -> impl Iterator<Item = &str> {
        self.tag.split('-').skip(1)
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Never, Some(ParamMode::Weighted))
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        let valid = self.tag == "*"
            || self
                .tag
                .split('-')
                .all(|part| (1..=8).contains(&part.len()) && part.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return Err(HttpError::InvalidToken(self.tag.clone()));
        }
        line.push_str(&self.tag);
        Params {
            list: Vec::new(),
            weight: self.weight,
        }
        .render(line)
    }
}

impl LanguageRange {
    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            tag: element.name,
            weight: element.params.weight,
        }
    }
}

/// A protocol named in `Upgrade`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpgradeProtocol {
    pub name: String,
    pub version: Option<String>,
}

impl UpgradeProtocol {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            version: version.map(str::to_owned),
        }
    }

    pub fn websocket() -> Self {
        Self::new("websocket", None)
    }

    pub(crate) fn parser() -> ElementParser {
        ElementParser::new(Slash::Optional, None)
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, &self.name)?;
        if let Some(version) = &self.version {
            line.push('/');
            write_token(line, version)?;
        }
        Ok(())
    }
}

impl UpgradeProtocol {
    pub(crate) fn from_element(element: Element) -> Self {
        Self {
            name: element.name,
            version: element.sub,
        }
    }
}

/// A product and the comments following it, as in `User-Agent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Product {
    pub name: String,
    pub version: Option<String>,
    pub comments: Vec<String>,
}

impl Product {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            version: version.map(str::to_owned),
            comments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comments.push(comment.to_owned());
        self
    }

    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, &self.name)?;
        if let Some(version) = &self.version {
            line.push('/');
            write_token(line, version)?;
        }
        for comment in &self.comments {
            line.push(' ');
            write_comment(line, comment)?;
        }
        Ok(())
    }
}

enum ProductStep {
    Start,
    Product(ElementParser),
    Comment(CommentParser),
}

/// Reads `product *( RWS ( product / comment ) )`.
pub(crate) struct ProductsParser {
    products: Vec<Product>,
    step: ProductStep,
}

impl ProductsParser {
    pub(crate) fn new() -> Self {
        Self {
            products: Vec::new(),
            step: ProductStep::Start,
        }
    }
}

impl Parser for ProductsParser {
    type Value = Vec<Product>;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Vec<Product>> {
        let ProductsParser {
            mut products,
            mut step,
        } = self;
        loop {
            step = match step {
                ProductStep::Start => {
                    while input.head().is_some_and(is_space) {
                        input.step();
                    }
                    match input.head() {
                        Some('(') if products.is_empty() => {
                            return Parsed::Error(Diagnostic::expected("product", input));
                        }
                        Some('(') => ProductStep::Comment(CommentParser::new()),
                        Some('\r') if !products.is_empty() => return Parsed::Done(products),
                        Some(_) => ProductStep::Product(UpgradeProtocol::parser()),
                        None if input.is_empty() => {
                            return Parsed::Cont(ProductsParser {
                                products,
                                step: ProductStep::Start,
                            });
                        }
                        None if products.is_empty() => {
                            return Parsed::Error(Diagnostic::expected("product", input));
                        }
                        None => return Parsed::Done(products),
                    }
                }
                ProductStep::Product(parser) => {
                    let element = resume!(parser.feed(input), |parser| ProductsParser {
                        products,
                        step: ProductStep::Product(parser),
                    });
                    products.push(Product {
                        name: element.name,
                        version: element.sub,
                        comments: Vec::new(),
                    });
                    ProductStep::Start
                }
                ProductStep::Comment(parser) => {
                    let comment = resume!(parser.feed(input), |parser| ProductsParser {
                        products,
                        step: ProductStep::Comment(parser),
                    });
                    if let Some(product) = products.last_mut() {
                        product.comments.push(comment);
                    }
                    ProductStep::Start
                }
            };
        }
    }
}
